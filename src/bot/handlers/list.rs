use crate::bot::{Bot, BotError};
use crate::services::catalog::ImageListing;
use crate::services::telegram::Message;

pub const PAGE_SIZE: u64 = 10;

pub async fn handle_list(bot: &Bot, message: &Message, page: Option<&str>) -> Result<(), BotError> {
    let page = match page {
        None => 1,
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(BotError::Usage("⚠️ Usage: /list [page]"))?,
    };
    let offset = (page - 1) * PAGE_SIZE;

    let rows = bot.catalog.list(PAGE_SIZE, offset).await?;

    bot.reply(message.chat.id, &render_page(&rows, page, offset))
        .await
}

fn render_page(rows: &[ImageListing], page: u64, offset: u64) -> String {
    if rows.is_empty() {
        return if page == 1 {
            "📭 No images uploaded yet.".to_string()
        } else {
            format!("📭 No images on page {}.", page)
        };
    }

    let mut text = format!("🖼️ Images (page {}):\n", page);
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {}\n🔗 {}",
            offset + i as u64 + 1,
            row.title,
            row.share_link
        ));
    }
    if rows.len() as u64 == PAGE_SIZE {
        text.push_str(&format!("\n\n➡️ More: /list {}", page + 1));
    }
    text
}
