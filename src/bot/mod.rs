use crate::services::catalog::CatalogStore;
use crate::services::drive::DriveProvider;
use crate::services::telegram::{Message, Messenger, Update, User};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub mod command;
pub mod error;
pub mod handlers;
pub mod poller;
pub mod webhook;

pub use command::Command;
pub use error::BotError;
pub use poller::UpdatePoller;

#[derive(Debug, Clone)]
pub struct BotSettings {
    /// The only user allowed to upload, delete and read stats
    pub admin_id: i64,
    /// Drive folder receiving uploads
    pub folder_id: String,
}

/// Routes platform events to handlers and turns handler failures into replies.
pub struct Bot {
    pub(crate) catalog: CatalogStore,
    pub(crate) drive: Arc<dyn DriveProvider>,
    pub(crate) messenger: Arc<dyn Messenger>,
    pub(crate) settings: BotSettings,
}

impl Bot {
    pub fn new(
        catalog: CatalogStore,
        drive: Arc<dyn DriveProvider>,
        messenger: Arc<dyn Messenger>,
        settings: BotSettings,
    ) -> Self {
        Self {
            catalog,
            drive,
            messenger,
            settings,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn is_admin(&self, user: Option<&User>) -> bool {
        user.is_some_and(|u| u.id == self.settings.admin_id)
    }

    /// Handles one update to completion. Never fails: errors become replies or logs.
    pub async fn handle_update(&self, update: Update) {
        debug!("Handling update {}", update.update_id);

        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(query) = update.callback_query {
            handlers::callback::handle_callback(self, &query).await;
        } else if let Some(query) = update.inline_query {
            if let Err(e) = handlers::inline::handle_inline_query(self, &query).await {
                error!("❌ Inline query '{}' failed: {}", query.query, e);
            }
        } else {
            debug!("Ignoring update {} with no supported payload", update.update_id);
        }
    }

    async fn handle_message(&self, message: Message) {
        let chat_id = message.chat.id;
        if let Err(e) = self.route_message(&message).await {
            self.report(chat_id, e).await;
        }
    }

    async fn route_message(&self, message: &Message) -> Result<(), BotError> {
        let command = message.body().and_then(Command::parse);

        if message.photo.is_some() {
            // A photo's caption is either `/upload <title>` or the title itself
            let args = match &command {
                Some(Command::Upload(args)) => args.as_deref(),
                Some(_) => None,
                None => message.caption.as_deref(),
            };
            return handlers::upload::handle_upload(self, message, args).await;
        }

        match command {
            Some(Command::Start) | Some(Command::Help) => {
                handlers::start::handle_start(self, message).await
            }
            Some(Command::Upload(args)) => {
                handlers::upload::handle_upload(self, message, args.as_deref()).await
            }
            Some(Command::Delete(args)) => {
                handlers::delete::handle_delete(self, message, args.as_deref()).await
            }
            Some(Command::List(args)) => {
                handlers::list::handle_list(self, message, args.as_deref()).await
            }
            Some(Command::Stats) => handlers::stats::handle_stats(self, message).await,
            Some(Command::Unknown(name)) => {
                debug!("Ignoring unknown command /{}", name);
                Ok(())
            }
            None => match message.text.as_deref() {
                Some(text) => handlers::lookup::handle_lookup(self, message, text).await,
                None => {
                    debug!("Ignoring message {} without text", message.message_id);
                    Ok(())
                }
            },
        }
    }

    async fn report(&self, chat_id: i64, err: BotError) {
        if !err.is_reportable() {
            error!("❌ Could not reply in chat {}: {}", chat_id, err);
            return;
        }

        match &err {
            BotError::Unauthorized(_) | BotError::Validation(_) | BotError::Usage(_) => {
                debug!("Rejected request in chat {}: {}", chat_id, err)
            }
            BotError::NotFound(_) | BotError::Duplicate(_) => {
                debug!("Request in chat {} not served: {}", chat_id, err)
            }
            _ => error!("❌ Request in chat {} failed: {}", chat_id, err),
        }

        if let Err(e) = self
            .messenger
            .send_text(chat_id, &err.user_message())
            .await
        {
            error!("❌ Could not send error reply to chat {}: {}", chat_id, e);
        }
    }

    /// Terminal reply for a successful request.
    pub(crate) async fn reply(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.messenger
            .send_text(chat_id, text)
            .await
            .map_err(BotError::Reply)
    }

    /// Progress notice; failure to deliver it does not abort the request.
    pub(crate) async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            warn!("Progress notice to chat {} not delivered: {}", chat_id, e);
        }
    }
}
