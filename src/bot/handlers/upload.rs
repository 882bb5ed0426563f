use crate::bot::{Bot, BotError};
use crate::services::catalog::{CreateOutcome, NewImage};
use crate::services::drive::{RemoteFile, UploadRequest};
use crate::services::telegram::Message;
use crate::utils::validation::{extract_title, validate_title};
use tracing::{error, info, warn};

/// Admin upload: photo bytes go to Drive first, the catalog row is written last.
///
/// `title_source` is the `/upload` argument or the photo caption.
pub async fn handle_upload(
    bot: &Bot,
    message: &Message,
    title_source: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = message.chat.id;

    if !bot.is_admin(message.from.as_ref()) {
        return Err(BotError::Unauthorized("🚫 Only admin can upload images."));
    }

    let photo = message
        .largest_photo()
        .ok_or(BotError::Usage("❌ Please send an image file."))?;

    let title = extract_title(title_source, None)?;
    validate_title(&title)?;

    if bot.catalog.title_exists(&title).await? {
        return Err(BotError::Duplicate(title));
    }

    bot.notify(chat_id, &format!("⏳ Downloading image '{}'...", title))
        .await;
    let data = bot
        .messenger
        .download_file(&photo.file_id)
        .await
        .map_err(BotError::Download)?;
    let size = data.len() as i64;

    let uploader = message
        .from
        .as_ref()
        .map(|u| u.full_name())
        .unwrap_or_default();

    bot.notify(chat_id, "⏳ Uploading to Google Drive...").await;
    let remote = bot
        .drive
        .upload(UploadRequest {
            name: format!("{}.jpg", title),
            parent_folder: bot.settings.folder_id.clone(),
            description: Some(format!("Uploaded via Telegram by {}", uploader)),
            indexable_text: Some(title.clone()),
            mime_type: mime::IMAGE_JPEG.to_string(),
            data,
        })
        .await
        .map_err(BotError::Upload)?;

    if let Err(e) = bot.drive.set_public_read_permission(&remote.id).await {
        discard_remote(bot, &remote).await;
        return Err(BotError::Upload(e));
    }

    let outcome = bot
        .catalog
        .create(NewImage {
            title: title.clone(),
            source_file_id: photo.file_id.clone(),
            storage_file_id: remote.id.clone(),
            share_link: remote.view_link.clone(),
            direct_link: remote.content_link.clone(),
            file_size: photo.file_size.or(Some(size)),
            uploader_id: message.from.as_ref().map(|u| u.id),
        })
        .await;

    let record = match outcome {
        Ok(CreateOutcome::Created(record)) => record,
        Ok(CreateOutcome::Duplicate) => {
            // Lost a race with a concurrent upload of the same title
            discard_remote(bot, &remote).await;
            return Err(BotError::Duplicate(title));
        }
        Err(e) => {
            discard_remote(bot, &remote).await;
            return Err(e.into());
        }
    };

    info!(
        "✅ Uploaded '{}' to {} (ID: {}, {} bytes)",
        record.title,
        bot.drive.provider_id(),
        record.storage_file_id,
        size
    );

    bot.reply(
        chat_id,
        &format!(
            "✅ Successfully uploaded '{}'\n\n🔗 Share link: {}",
            record.title, record.share_link
        ),
    )
    .await
}

/// Deletes a remote file whose catalog row was never written.
async fn discard_remote(bot: &Bot, remote: &RemoteFile) {
    match bot.drive.delete(&remote.id).await {
        Ok(()) => warn!("↩️ Removed orphaned Drive file {}", remote.id),
        Err(e) => error!(
            "❌ Drive file {} is orphaned and could not be removed: {}",
            remote.id, e
        ),
    }
}
