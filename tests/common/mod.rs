#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use drive_image_bot::infrastructure::database;
use drive_image_bot::services::catalog::CatalogStore;
use drive_image_bot::services::drive::{DriveError, DriveProvider, RemoteFile, UploadRequest};
use drive_image_bot::services::executor::{Executor, RetryPolicy};
use drive_image_bot::services::telegram::{
    InlineKeyboardMarkup, InlinePhotoResult, MessageTarget, Messenger, Update,
};
use drive_image_bot::{Bot, BotSettings};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const ADMIN_ID: i64 = 1001;
pub const USER_ID: i64 = 2002;
pub const FOLDER_ID: &str = "folder-123";

pub const FAKE_JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-body";

pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_unit: Duration::from_millis(10),
    }
}

pub async fn setup_catalog(dir: &TempDir) -> CatalogStore {
    let path = dir.path().join("images.db");
    let db = database::connect(path.to_str().unwrap(), Duration::from_secs(5), 4)
        .await
        .unwrap();
    database::init_schema(&db).await.unwrap();
    database::migrate(&db).await.unwrap();
    CatalogStore::new(Executor::new(db, test_policy()))
}

// Mock Drive that keeps files in memory
#[derive(Default)]
pub struct MockDrive {
    pub files: Mutex<HashMap<String, String>>,
    pub public: Mutex<HashSet<String>>,
    pub uploads: AtomicUsize,
    pub fail_upload: AtomicBool,
    pub fail_permission: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockDrive {
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn view_link(id: &str) -> String {
        format!("https://drive.google.com/file/d/{}/view", id)
    }
}

#[async_trait]
impl DriveProvider for MockDrive {
    fn provider_id(&self) -> &'static str {
        "mock_drive"
    }

    async fn upload(&self, request: UploadRequest) -> Result<RemoteFile, DriveError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(DriveError::Api {
                status: 403,
                message: "The user's Drive storage quota has been exceeded.".to_string(),
            });
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("drive-{}", n);
        self.files
            .lock()
            .unwrap()
            .insert(id.clone(), request.name.clone());

        Ok(RemoteFile {
            view_link: Self::view_link(&id),
            content_link: Some(format!("https://drive.google.com/uc?id={}", id)),
            id,
        })
    }

    async fn set_public_read_permission(&self, file_id: &str) -> Result<(), DriveError> {
        if self.fail_permission.load(Ordering::SeqCst) {
            return Err(DriveError::Api {
                status: 500,
                message: "Internal Error".to_string(),
            });
        }
        self.public.lock().unwrap().insert(file_id.to_string());
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> Result<(), DriveError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(DriveError::Api {
                status: 503,
                message: "Backend Error".to_string(),
            });
        }
        match self.files.lock().unwrap().remove(file_id) {
            Some(_) => Ok(()),
            None => Err(DriveError::NotFound),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
    },
    Photo {
        chat_id: i64,
        photo_file_id: String,
        caption: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    CallbackAnswer {
        callback_id: String,
        text: Option<String>,
    },
    CaptionEdit {
        target: MessageTarget,
        caption: String,
    },
    InlineAnswer {
        query_id: String,
        results: Vec<InlinePhotoResult>,
    },
}

// Mock Messenger recording everything the bot sends
#[derive(Default)]
pub struct MockMessenger {
    pub sent: Mutex<Vec<Sent>>,
}

impl MockMessenger {
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_file_id: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> anyhow::Result<()> {
        self.record(Sent::Photo {
            chat_id,
            photo_file_id: photo_file_id.to_string(),
            caption: caption.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> anyhow::Result<()> {
        self.record(Sent::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn edit_caption(&self, target: &MessageTarget, caption: &str) -> anyhow::Result<()> {
        self.record(Sent::CaptionEdit {
            target: target.clone(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn answer_inline_query(
        &self,
        query_id: &str,
        results: Vec<InlinePhotoResult>,
    ) -> anyhow::Result<()> {
        self.record(Sent::InlineAnswer {
            query_id: query_id.to_string(),
            results,
        });
        Ok(())
    }

    async fn download_file(&self, _file_id: &str) -> anyhow::Result<Bytes> {
        Ok(Bytes::from_static(FAKE_JPEG))
    }
}

pub struct TestBot {
    pub bot: Arc<Bot>,
    pub drive: Arc<MockDrive>,
    pub messenger: Arc<MockMessenger>,
    pub catalog: CatalogStore,
    _dir: TempDir,
}

pub async fn setup_bot() -> TestBot {
    let dir = tempfile::tempdir().unwrap();
    let catalog = setup_catalog(&dir).await;
    let drive = Arc::new(MockDrive::default());
    let messenger = Arc::new(MockMessenger::default());

    let bot = Arc::new(Bot::new(
        catalog.clone(),
        drive.clone(),
        messenger.clone(),
        BotSettings {
            admin_id: ADMIN_ID,
            folder_id: FOLDER_ID.to_string(),
        },
    ));

    TestBot {
        bot,
        drive,
        messenger,
        catalog,
        _dir: dir,
    }
}

fn user(id: i64) -> serde_json::Value {
    json!({"id": id, "is_bot": false, "first_name": "Test", "last_name": "User"})
}

pub fn text_update(user_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "chat": {"id": user_id, "type": "private"},
            "from": user(user_id),
            "text": text
        }
    }))
    .unwrap()
}

pub fn photo_update(user_id: i64, caption: Option<&str>, file_id: &str) -> Update {
    let mut message = json!({
        "message_id": 11,
        "chat": {"id": user_id, "type": "private"},
        "from": user(user_id),
        "photo": [
            {"file_id": format!("{}-thumb", file_id), "file_unique_id": "t", "width": 90, "height": 60, "file_size": 1200},
            {"file_id": file_id, "file_unique_id": "f", "width": 1280, "height": 853, "file_size": 98765}
        ]
    });
    if let Some(caption) = caption {
        message["caption"] = json!(caption);
    }
    serde_json::from_value(json!({"update_id": 2, "message": message})).unwrap()
}

pub fn callback_update(user_id: i64, data: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 3,
        "callback_query": {
            "id": "cb-1",
            "from": user(user_id),
            "message": {
                "message_id": 12,
                "chat": {"id": user_id, "type": "private"},
                "caption": "📌 whatever"
            },
            "data": data
        }
    }))
    .unwrap()
}

pub fn inline_update(user_id: i64, query: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 4,
        "inline_query": {
            "id": "iq-1",
            "from": user(user_id),
            "query": query,
            "offset": ""
        }
    }))
    .unwrap()
}

/// Admin uploads a photo captioned with `title`.
pub async fn upload(t: &TestBot, title: &str) {
    t.bot
        .handle_update(photo_update(ADMIN_ID, Some(title), &format!("tg-{}", title)))
        .await;
}
