use crate::bot::{Bot, BotError};
use crate::services::telegram::Message;

const WELCOME: &str = "👋 Welcome to the Drive Bot!\n\n\
    📤 Admin Upload: /upload <title> + image\n\
    🔍 Search: Type any image title\n\
    📚 Browse: /list [page]\n\
    🔎 Inline: @<bot> <part of a title>\n\
    🗑️ Admin Delete: /delete <title>\n\
    📊 Admin Stats: /stats\n\n\
    📝 Note: Upload images with captions to set titles";

pub async fn handle_start(bot: &Bot, message: &Message) -> Result<(), BotError> {
    bot.reply(message.chat.id, WELCOME).await
}
