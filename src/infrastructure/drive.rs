use crate::config::BotConfig;
use crate::services::drive::{GoogleDriveClient, ServiceAccountKey};
use std::sync::Arc;
use tracing::info;

pub fn setup_drive(config: &BotConfig) -> anyhow::Result<Arc<GoogleDriveClient>> {
    let key = ServiceAccountKey::from_file(&config.service_account_file)?;
    let client = GoogleDriveClient::new(key)?;

    info!(
        "☁️  Google Drive: {} (Folder: {})",
        client.client_email(),
        config.folder_id
    );

    Ok(Arc::new(client))
}
