use super::LINK_CALLBACK_PREFIX;
use crate::bot::Bot;
use crate::services::telegram::{CallbackQuery, MessageTarget};
use tracing::{debug, error, warn};

/// Button presses: `link_<title>` swaps the photo caption for the share link.
pub async fn handle_callback(bot: &Bot, query: &CallbackQuery) {
    let title = query
        .data
        .as_deref()
        .and_then(|data| data.strip_prefix(LINK_CALLBACK_PREFIX));

    let Some(title) = title else {
        debug!("Ignoring callback with payload {:?}", query.data);
        answer(bot, query, None).await;
        return;
    };

    let Some(target) = MessageTarget::from_callback(query) else {
        // Nothing to edit; the popup is the only reply channel left
        answer(bot, query, Some("⚠️ Message is no longer available.")).await;
        return;
    };

    answer(bot, query, None).await;

    let caption = match bot.catalog.get_by_title(title).await {
        Ok(Some(record)) => format!("📌 {}\n🔗 {}", record.title, record.share_link),
        Ok(None) => "❌ Link not found.".to_string(),
        Err(e) => {
            error!("❌ Link lookup for '{}' failed: {}", title, e);
            "⚠️ Error retrieving link.".to_string()
        }
    };

    if let Err(e) = bot.messenger.edit_caption(&target, &caption).await {
        error!("❌ Could not edit caption for '{}': {}", title, e);
    }
}

async fn answer(bot: &Bot, query: &CallbackQuery, text: Option<&str>) {
    if let Err(e) = bot.messenger.answer_callback(&query.id, text).await {
        warn!("Callback {} not answered: {}", query.id, e);
    }
}
