use super::link_button;
use crate::bot::{Bot, BotError};
use crate::services::telegram::{InlineKeyboardMarkup, InlinePhotoResult, InlineQuery};
use tracing::debug;

/// Telegram shows at most this many inline results per answer here.
pub const INLINE_RESULT_LIMIT: u64 = 10;

/// Substring search over titles, answered with cached photos.
pub async fn handle_inline_query(bot: &Bot, query: &InlineQuery) -> Result<(), BotError> {
    let text = query.query.trim();
    if text.is_empty() {
        debug!("Empty inline query {} from {}", query.id, query.from.id);
        return Ok(());
    }

    let hits = bot.catalog.search(text, INLINE_RESULT_LIMIT).await?;

    let results = hits
        .into_iter()
        .enumerate()
        .map(|(idx, hit)| {
            let mut result = InlinePhotoResult::new(idx.to_string(), hit.source_file_id, &hit.title);
            result.reply_markup = link_button("🔗 Get Link", &hit.title)
                .map(|button| InlineKeyboardMarkup::row(vec![button]));
            result
        })
        .collect::<Vec<_>>();

    debug!("Inline query '{}' matched {} image(s)", text, results.len());

    bot.messenger
        .answer_inline_query(&query.id, results)
        .await
        .map_err(BotError::Reply)
}
