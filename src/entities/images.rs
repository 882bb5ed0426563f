use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    /// Telegram file handle of the uploaded photo
    pub source_file_id: String,
    /// Google Drive file id
    #[sea_orm(unique)]
    pub storage_file_id: String,
    pub share_link: String,
    pub direct_link: Option<String>,
    #[sea_orm(default_value = "image/jpeg")]
    pub mime_type: String,
    pub file_size: Option<i64>,
    pub upload_time: DateTimeUtc,
    pub last_accessed: Option<DateTimeUtc>,
    pub uploader_id: Option<i64>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
