mod common;

use anyhow::anyhow;
use async_trait::async_trait;
use common::*;
use drive_image_bot::bot::UpdatePoller;
use drive_image_bot::bot::poller::UpdateSource;
use drive_image_bot::services::telegram::Update;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Serves one batch of updates, fails once, then idles
#[derive(Default)]
struct ScriptedSource {
    prepared: AtomicBool,
    offsets: Mutex<Vec<i64>>,
    batch: Mutex<Option<Vec<Update>>>,
    failed_once: AtomicBool,
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn prepare(&self) -> anyhow::Result<()> {
        self.prepared.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn poll(&self, offset: i64, _timeout_secs: u64) -> anyhow::Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);

        if let Some(batch) = self.batch.lock().unwrap().take() {
            return Ok(batch);
        }
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(anyhow!("connection reset"));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Vec::new())
    }
}

fn with_id(mut update: Update, id: i64) -> Update {
    update.update_id = id;
    update
}

#[tokio::test]
async fn test_poller_dispatches_and_stops_on_shutdown() {
    let t = setup_bot().await;
    let source = Arc::new(ScriptedSource::default());
    *source.batch.lock().unwrap() = Some(vec![
        with_id(text_update(USER_ID, "/start"), 41),
        with_id(text_update(USER_ID, "Unknown title"), 42),
    ]);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller = UpdatePoller::new(t.bot.clone(), source.clone(), 1, shutdown_rx);
    let handle = tokio::spawn(poller.run());

    for _ in 0..100 {
        if t.messenger.texts().len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller did not stop")
        .unwrap()
        .unwrap();

    assert!(source.prepared.load(Ordering::SeqCst));
    let offsets = source.offsets.lock().unwrap().clone();
    assert_eq!(offsets[0], 0);
    assert_eq!(offsets[1], 43);

    let mut texts = t.messenger.texts();
    texts.sort();
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().any(|t| t.starts_with("👋 Welcome")));
    assert!(texts.iter().any(|t| t == "🚫 Image not found. Try another title."));
}

struct UnreachableSource;

#[async_trait]
impl UpdateSource for UnreachableSource {
    async fn prepare(&self) -> anyhow::Result<()> {
        Err(anyhow!("deleteWebhook: connection refused"))
    }

    async fn poll(&self, _offset: i64, _timeout_secs: u64) -> anyhow::Result<Vec<Update>> {
        panic!("polled before the source was prepared");
    }
}

#[tokio::test]
async fn test_poller_fails_fast_when_prepare_fails() {
    let t = setup_bot().await;
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller = UpdatePoller::new(t.bot.clone(), Arc::new(UnreachableSource), 1, shutdown_rx);

    // Returns without waiting for shutdown so the caller can abort startup
    let result = tokio::time::timeout(Duration::from_secs(5), poller.run())
        .await
        .expect("poller kept running after prepare failed");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
    assert!(t.messenger.texts().is_empty());
}
