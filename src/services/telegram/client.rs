use super::{
    InlineKeyboardMarkup, InlinePhotoResult, MessageTarget, Messenger, TelegramFile, Update,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i32>,
}

/// Bot API client over HTTPS.
pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T> {
        self.call_with_timeout(method, payload, None).await
    }

    async fn call_with_timeout<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self.http.post(self.method_url(method)).json(&payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let res: ApiResponse<T> = request
            .send()
            .await
            .map_err(|e| anyhow!("Telegram {} request failed: {}", method, e.without_url()))?
            .json()
            .await?;

        if !res.ok {
            return Err(anyhow!(
                "Telegram {} failed ({}): {}",
                method,
                res.error_code.unwrap_or_default(),
                res.description.unwrap_or_default()
            ));
        }

        res.result
            .ok_or_else(|| anyhow!("Telegram {} returned no result", method))
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call_with_timeout(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query", "inline_query"],
            }),
            // leave room for the server-side wait
            Some(Duration::from_secs(timeout_secs + 10)),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str, drop_pending_updates: bool) -> Result<()> {
        let _: bool = self
            .call(
                "setWebhook",
                json!({
                    "url": url,
                    "drop_pending_updates": drop_pending_updates,
                    "allowed_updates": ["message", "callback_query", "inline_query"],
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                json!({ "drop_pending_updates": drop_pending_updates }),
            )
            .await?;
        Ok(())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        self.call("getFile", json!({ "file_id": file_id })).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_file_id: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "photo": photo_file_id,
            "caption": caption,
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)?;
        }
        let _: Value = self.call("sendPhoto", payload).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = Value::String(text.to_string());
        }
        let _: bool = self.call("answerCallbackQuery", payload).await?;
        Ok(())
    }

    async fn edit_caption(&self, target: &MessageTarget, caption: &str) -> Result<()> {
        let payload = match target {
            MessageTarget::Chat {
                chat_id,
                message_id,
            } => json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "caption": caption,
            }),
            MessageTarget::Inline(inline_message_id) => json!({
                "inline_message_id": inline_message_id,
                "caption": caption,
            }),
        };
        // Message for chat targets, `true` for inline ones
        let _: Value = self.call("editMessageCaption", payload).await?;
        Ok(())
    }

    async fn answer_inline_query(
        &self,
        query_id: &str,
        results: Vec<InlinePhotoResult>,
    ) -> Result<()> {
        let _: bool = self
            .call(
                "answerInlineQuery",
                json!({
                    "inline_query_id": query_id,
                    "results": results,
                    "cache_time": 1,
                }),
            )
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Bytes> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| anyhow!("Telegram returned no file_path for {}", file_id))?;

        debug!("Downloading Telegram file {}", path);

        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, path);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Telegram file download failed: {}", e.without_url()))?;

        if !res.status().is_success() {
            return Err(anyhow!("Telegram file download returned {}", res.status()));
        }

        Ok(res.bytes().await?)
    }
}
