use crate::config::BotConfig;
use crate::services::telegram::TelegramClient;
use std::sync::Arc;
use tracing::info;

pub fn setup_telegram(config: &BotConfig) -> Arc<TelegramClient> {
    info!("🤖 Telegram Bot API client ready (admin: {})", config.admin_id);
    Arc::new(TelegramClient::new(config.telegram_bot_token.clone()))
}
