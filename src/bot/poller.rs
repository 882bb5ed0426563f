use crate::bot::Bot;
use crate::services::telegram::{TelegramClient, Update};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

/// Wait after a failed `getUpdates` before polling again.
const ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Where long-polled updates come from.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Switch the bot to pull delivery, dropping anything queued for a webhook.
    async fn prepare(&self) -> Result<()>;

    async fn poll(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn prepare(&self) -> Result<()> {
        self.delete_webhook(true).await
    }

    async fn poll(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.get_updates(offset, timeout_secs).await
    }
}

/// Long-poll loop. Every update runs on its own task so a slow upload
/// never holds up lookups.
pub struct UpdatePoller {
    bot: Arc<Bot>,
    source: Arc<dyn UpdateSource>,
    timeout_secs: u64,
    shutdown: watch::Receiver<bool>,
}

impl UpdatePoller {
    pub fn new(
        bot: Arc<Bot>,
        source: Arc<dyn UpdateSource>,
        timeout_secs: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            bot,
            source,
            timeout_secs,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.source.prepare().await?;
        info!("🚀 Polling for updates (timeout {}s)", self.timeout_secs);

        let mut offset = 0;
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    info!("🛑 Poller shutting down");
                    break;
                }
                res = self.source.poll(offset, self.timeout_secs) => match res {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            let bot = self.bot.clone();
                            tokio::spawn(async move {
                                bot.handle_update(update).await;
                            });
                        }
                    }
                    Err(e) => {
                        warn!("⚠️ Polling failed: {}. Retrying in {:?}", e, ERROR_BACKOFF);
                        tokio::select! {
                            _ = self.shutdown.changed() => {
                                info!("🛑 Poller shutting down");
                                break;
                            }
                            _ = sleep(ERROR_BACKOFF) => {}
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
