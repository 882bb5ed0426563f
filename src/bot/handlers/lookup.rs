use super::{caption_for, link_button};
use crate::bot::{Bot, BotError};
use crate::services::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, Message};
use tracing::info;

/// Free text is treated as an exact title.
pub async fn handle_lookup(bot: &Bot, message: &Message, text: &str) -> Result<(), BotError> {
    let title = text.trim();

    let record = bot
        .catalog
        .get_by_title(title)
        .await?
        .ok_or_else(|| BotError::NotFound(title.to_string()))?;

    let mut buttons = vec![InlineKeyboardButton::url(
        "🌐 Open in Drive",
        record.share_link.clone(),
    )];
    buttons.extend(link_button("🔗 Get Drive Link", &record.title));

    bot.messenger
        .send_photo(
            message.chat.id,
            &record.source_file_id,
            &caption_for(&record.title),
            Some(InlineKeyboardMarkup::row(buttons)),
        )
        .await
        .map_err(BotError::Reply)?;

    info!("🖼️ Served image '{}'", record.title);
    Ok(())
}
