use crate::entities::{images, prelude::*};
use crate::services::executor::{Executor, StoreError};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use tracing::{debug, info, warn};

pub type ImageRecord = images::Model;

/// Fields supplied by the upload flow once the remote copy exists.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub title: String,
    pub source_file_id: String,
    pub storage_file_id: String,
    pub share_link: String,
    pub direct_link: Option<String>,
    pub file_size: Option<i64>,
    pub uploader_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(ImageRecord),
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ImageListing {
    pub title: String,
    pub share_link: String,
    pub upload_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct SearchHit {
    pub title: String,
    pub share_link: String,
    pub source_file_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CatalogStats {
    pub total_images: i64,
    pub total_size: i64,
    pub oldest_upload: Option<DateTime<Utc>>,
    pub newest_upload: Option<DateTime<Utc>>,
}

#[derive(Debug, FromQueryResult)]
struct AggregateRow {
    total_images: i64,
    total_size: Option<i64>,
}

/// Image catalog backed by the `images` table. Every call runs through the
/// executor, so each one gets its own transaction and lock-retry policy.
#[derive(Clone)]
pub struct CatalogStore {
    executor: Executor,
}

impl CatalogStore {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub async fn create(&self, image: NewImage) -> Result<CreateOutcome, StoreError> {
        self.executor
            .run("create", move |txn| {
                let image = image.clone();
                Box::pin(async move {
                    let now = Utc::now();
                    let model = images::ActiveModel {
                        title: Set(image.title.clone()),
                        source_file_id: Set(image.source_file_id),
                        storage_file_id: Set(image.storage_file_id),
                        share_link: Set(image.share_link),
                        direct_link: Set(image.direct_link),
                        mime_type: Set(mime::IMAGE_JPEG.to_string()),
                        file_size: Set(image.file_size),
                        upload_time: Set(now),
                        last_accessed: Set(Some(now)),
                        uploader_id: Set(image.uploader_id),
                        is_active: Set(true),
                        ..Default::default()
                    };

                    match model.insert(txn).await {
                        Ok(record) => Ok(CreateOutcome::Created(record)),
                        Err(err) => match StoreError::from(err) {
                            StoreError::Duplicate(msg) => {
                                warn!("Duplicate image '{}': {}", image.title, msg);
                                Ok(CreateOutcome::Duplicate)
                            }
                            other => Err(other),
                        },
                    }
                })
            })
            .await
    }

    /// Touches `last_accessed` for the title, then reads the active row.
    /// The touch runs whether or not an active row matches.
    pub async fn get_by_title(&self, title: &str) -> Result<Option<ImageRecord>, StoreError> {
        let title = title.to_owned();
        self.executor
            .run("get_by_title", move |txn| {
                let title = title.clone();
                Box::pin(async move {
                    let touched = Images::update_many()
                        .col_expr(images::Column::LastAccessed, Expr::value(Utc::now()))
                        .filter(images::Column::Title.eq(&title))
                        .exec(txn)
                        .await?;
                    debug!("last_accessed touched on {} row(s)", touched.rows_affected);

                    let record = Images::find()
                        .filter(images::Column::Title.eq(&title))
                        .filter(images::Column::IsActive.eq(true))
                        .one(txn)
                        .await?;
                    Ok(record)
                })
            })
            .await
    }

    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<ImageListing>, StoreError> {
        self.executor
            .run("list", move |txn| {
                Box::pin(async move {
                    let rows = Images::find()
                        .select_only()
                        .column(images::Column::Title)
                        .column(images::Column::ShareLink)
                        .column(images::Column::UploadTime)
                        .filter(images::Column::IsActive.eq(true))
                        .order_by_desc(images::Column::UploadTime)
                        .order_by_desc(images::Column::Id)
                        .limit(limit)
                        .offset(offset)
                        .into_model::<ImageListing>()
                        .all(txn)
                        .await?;
                    Ok(rows)
                })
            })
            .await
    }

    /// Substring search over active titles. LIKE wildcards in the query
    /// are matched literally.
    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<SearchHit>, StoreError> {
        let pattern = format!("%{}%", escape_like(query));
        self.executor
            .run("search", move |txn| {
                let pattern = pattern.clone();
                Box::pin(async move {
                    let rows = Images::find()
                        .select_only()
                        .column(images::Column::Title)
                        .column(images::Column::ShareLink)
                        .column(images::Column::SourceFileId)
                        .filter(
                            Expr::col((Images, images::Column::Title))
                                .like(LikeExpr::new(pattern).escape('\\')),
                        )
                        .filter(images::Column::IsActive.eq(true))
                        .limit(limit)
                        .into_model::<SearchHit>()
                        .all(txn)
                        .await?;
                    Ok(rows)
                })
            })
            .await
    }

    pub async fn soft_delete(&self, title: &str) -> Result<bool, StoreError> {
        let title = title.to_owned();
        self.executor
            .run("soft_delete", move |txn| {
                let title = title.clone();
                Box::pin(async move {
                    let res = Images::update_many()
                        .col_expr(images::Column::IsActive, Expr::value(false))
                        .filter(images::Column::Title.eq(&title))
                        .exec(txn)
                        .await?;
                    Ok(res.rows_affected > 0)
                })
            })
            .await
    }

    pub async fn stats(&self) -> Result<CatalogStats, StoreError> {
        self.executor
            .run("stats", |txn| {
                Box::pin(async move {
                    let aggregate = Images::find()
                        .select_only()
                        .column_as(Expr::col(images::Column::Id).count(), "total_images")
                        .column_as(Expr::col(images::Column::FileSize).sum(), "total_size")
                        .filter(images::Column::IsActive.eq(true))
                        .into_model::<AggregateRow>()
                        .one(txn)
                        .await?;

                    let oldest = Images::find()
                        .filter(images::Column::IsActive.eq(true))
                        .order_by_asc(images::Column::UploadTime)
                        .one(txn)
                        .await?;
                    let newest = Images::find()
                        .filter(images::Column::IsActive.eq(true))
                        .order_by_desc(images::Column::UploadTime)
                        .one(txn)
                        .await?;

                    let (total_images, total_size) = aggregate
                        .map(|row| (row.total_images, row.total_size.unwrap_or(0)))
                        .unwrap_or((0, 0));

                    Ok(CatalogStats {
                        total_images,
                        total_size,
                        oldest_upload: oldest.map(|m| m.upload_time),
                        newest_upload: newest.map(|m| m.upload_time),
                    })
                })
            })
            .await
    }

    /// Lookup that ignores the soft-delete flag.
    pub async fn find_any_by_title(&self, title: &str) -> Result<Option<ImageRecord>, StoreError> {
        let title = title.to_owned();
        self.executor
            .run("find_any_by_title", move |txn| {
                let title = title.clone();
                Box::pin(async move {
                    let record = Images::find()
                        .filter(images::Column::Title.eq(&title))
                        .one(txn)
                        .await?;
                    Ok(record)
                })
            })
            .await
    }

    /// True when any row, active or not, already owns the title.
    pub async fn title_exists(&self, title: &str) -> Result<bool, StoreError> {
        let title = title.to_owned();
        self.executor
            .run("title_exists", move |txn| {
                let title = title.clone();
                Box::pin(async move {
                    let count = Images::find()
                        .filter(images::Column::Title.eq(&title))
                        .count(txn)
                        .await?;
                    Ok(count > 0)
                })
            })
            .await
    }

    pub async fn hard_delete(&self, title: &str) -> Result<u64, StoreError> {
        let title = title.to_owned();
        self.executor
            .run("hard_delete", move |txn| {
                let title = title.clone();
                Box::pin(async move {
                    let res = Images::delete_many()
                        .filter(images::Column::Title.eq(&title))
                        .exec(txn)
                        .await?;
                    if res.rows_affected > 0 {
                        info!("🗑️ Removed catalog row for '{}'", title);
                    }
                    Ok(res.rows_affected)
                })
            })
            .await
    }
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("cat"), "cat");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("x\\y"), "x\\\\y");
    }
}
