use crate::services::drive::DriveError;
use crate::services::executor::StoreError;
use crate::utils::validation::ValidationError;
use thiserror::Error;

/// Failures of a single event handler. Each one maps to the reply the user sees.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad usage: {0}")]
    Usage(&'static str),

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Title already exists: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Drive upload failed: {0}")]
    Upload(DriveError),

    #[error("Drive delete failed: {0}")]
    RemoteDelete(DriveError),

    #[error("Telegram download failed: {0}")]
    Download(anyhow::Error),

    /// The reply channel itself failed; nothing more can be sent.
    #[error("Reply failed: {0}")]
    Reply(anyhow::Error),
}

impl BotError {
    pub fn user_message(&self) -> String {
        match self {
            BotError::Unauthorized(msg) | BotError::Usage(msg) => msg.to_string(),
            BotError::Validation(e) => e.message.clone(),
            BotError::NotFound(_) => "🚫 Image not found. Try another title.".to_string(),
            BotError::Duplicate(title) => format!(
                "⚠️ Title '{}' already exists.\n\
                 Use /list to see existing images or choose a different title.",
                title
            ),
            BotError::Store(StoreError::Busy(_)) => {
                "⚠️ Database busy, please try again".to_string()
            }
            BotError::Store(StoreError::Database(_) | StoreError::Duplicate(_)) => {
                "⚠️ Database error occurred".to_string()
            }
            BotError::Upload(_) => "⚠️ Upload failed. Possible reasons:\n\
                 - Google Drive quota exceeded\n\
                 - Network issues\n\
                 - Invalid file format\n\n\
                 Please try again later."
                .to_string(),
            BotError::RemoteDelete(_) => {
                "❌ Could not delete the file from Google Drive. Nothing was removed, please try again later."
                    .to_string()
            }
            BotError::Download(_) => {
                "⚠️ Could not download the image from Telegram. Please send it again.".to_string()
            }
            BotError::Reply(_) => String::new(),
        }
    }

    /// Whether a reply can still be attempted for this error.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, BotError::Reply(_))
    }
}
