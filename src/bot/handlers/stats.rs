use crate::bot::{Bot, BotError};
use crate::services::catalog::CatalogStats;
use crate::services::telegram::Message;
use chrono::{DateTime, Utc};

pub async fn handle_stats(bot: &Bot, message: &Message) -> Result<(), BotError> {
    if !bot.is_admin(message.from.as_ref()) {
        return Err(BotError::Unauthorized("🚫 Admin only command."));
    }

    let stats = bot.catalog.stats().await?;
    bot.reply(message.chat.id, &render_stats(&stats)).await
}

fn render_stats(stats: &CatalogStats) -> String {
    format!(
        "📊 Catalog statistics\n\n\
         🖼️ Images: {}\n\
         💾 Total size: {}\n\
         📅 Oldest upload: {}\n\
         🆕 Newest upload: {}",
        stats.total_images,
        format_size(stats.total_size),
        format_time(stats.oldest_upload),
        format_time(stats.newest_upload)
    )
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
