use crate::bot::{Bot, BotError};
use crate::services::drive::DriveError;
use crate::services::telegram::Message;
use tracing::{info, warn};

/// Removes an image everywhere: the Drive file first, then the catalog row.
/// The row survives when Drive refuses, so a retry can finish the job.
pub async fn handle_delete(
    bot: &Bot,
    message: &Message,
    title: Option<&str>,
) -> Result<(), BotError> {
    if !bot.is_admin(message.from.as_ref()) {
        return Err(BotError::Unauthorized("🚫 Admin only command."));
    }

    let title = title.ok_or(BotError::Usage("⚠️ Usage: /delete <title>"))?;

    // Soft-deleted rows still own their Drive file, so the flag is ignored here
    let record = bot
        .catalog
        .find_any_by_title(title)
        .await?
        .ok_or_else(|| BotError::NotFound(title.to_string()))?;

    match bot.drive.delete(&record.storage_file_id).await {
        Ok(()) => {}
        Err(DriveError::NotFound) => warn!(
            "Drive file {} for '{}' was already gone",
            record.storage_file_id, title
        ),
        Err(e) => return Err(BotError::RemoteDelete(e)),
    }

    bot.catalog.hard_delete(title).await?;
    info!("🗑️ Deleted image '{}'", title);

    bot.reply(
        message.chat.id,
        &format!("🗑️ '{}' deleted successfully.", title),
    )
    .await
}
