use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::*;

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_file_id: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    /// Replace the caption of a previously sent photo and drop its keyboard
    async fn edit_caption(&self, target: &MessageTarget, caption: &str) -> Result<()>;

    async fn answer_inline_query(&self, query_id: &str, results: Vec<InlinePhotoResult>)
    -> Result<()>;

    /// Fetch the bytes behind a platform file handle
    async fn download_file(&self, file_id: &str) -> Result<Bytes>;
}
