use std::env;
use std::time::Duration;
use validator::Validate;

/// Runtime configuration for the bot process
#[derive(Debug, Clone, Validate)]
pub struct BotConfig {
    /// Telegram bot authentication token (required)
    #[validate(length(min = 1, message = "TELEGRAM_BOT_TOKEN must be set"))]
    pub telegram_bot_token: String,

    /// Telegram user id allowed to upload, delete and read stats (required)
    #[validate(range(min = 1, message = "ADMIN_ID must be a positive Telegram user id"))]
    pub admin_id: i64,

    /// Google Drive folder that receives uploads (required)
    #[validate(length(min = 1, message = "FOLDER_ID must be set"))]
    pub folder_id: String,

    /// SQLite database file (default: "images.db")
    #[validate(length(min = 1))]
    pub db_path: String,

    /// Log file path (default: "logs/bot.log")
    pub log_file: String,

    /// Attempts per store operation before giving up on a locked database (default: 3)
    #[validate(range(min = 1, max = 10))]
    pub max_retries: u32,

    /// Backoff unit between attempts in milliseconds (default: 500)
    pub retry_backoff_ms: u64,

    /// SQLite busy_timeout in milliseconds (default: 5000)
    pub busy_timeout_ms: u64,

    /// Pool size for the SQLite connection pool (default: 8)
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// Google service-account credentials JSON (default: "service_account.json")
    pub service_account_file: String,

    /// Public base URL for webhook delivery; polling is used when absent
    pub webhook_url: Option<String>,

    /// Port for the webhook server (default: 5000)
    pub port: u16,

    /// Long-poll timeout for getUpdates in seconds (default: 30)
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            admin_id: 0,
            folder_id: String::new(),
            db_path: "images.db".to_string(),
            log_file: "logs/bot.log".to_string(),
            max_retries: 3,
            retry_backoff_ms: 500,
            busy_timeout_ms: 5000,
            db_max_connections: 8,
            service_account_file: "service_account.json".to_string(),
            webhook_url: None,
            port: 5000,
            poll_timeout_secs: 30,
        }
    }
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .unwrap_or(default.telegram_bot_token),

            admin_id: env::var("ADMIN_ID")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.admin_id),

            folder_id: env::var("FOLDER_ID").unwrap_or(default.folder_id),

            db_path: env::var("DB_PATH").unwrap_or(default.db_path),

            log_file: env::var("LOG_FILE").unwrap_or(default.log_file),

            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retries),

            retry_backoff_ms: env::var("RETRY_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.retry_backoff_ms),

            busy_timeout_ms: env::var("BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.busy_timeout_ms),

            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.db_max_connections),

            service_account_file: env::var("SERVICE_ACCOUNT_FILE")
                .unwrap_or(default.service_account_file),

            // Render exposes the public URL as RENDER_EXTERNAL_URL
            webhook_url: env::var("WEBHOOK_URL")
                .or_else(|_| env::var("RENDER_EXTERNAL_URL"))
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.poll_timeout_secs),
        }
    }

    /// Config for local development and tests (fast retries, in-memory database)
    pub fn development() -> Self {
        Self {
            telegram_bot_token: "dev-token".to_string(),
            admin_id: 1,
            folder_id: "dev-folder".to_string(),
            db_path: ":memory:".to_string(),
            log_file: "logs/bot-dev.log".to_string(),
            max_retries: 3,
            retry_backoff_ms: 10,
            busy_timeout_ms: 1000,
            db_max_connections: 1,
            service_account_file: "service_account.json".to_string(),
            webhook_url: None,
            port: 5000,
            poll_timeout_secs: 5,
        }
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
