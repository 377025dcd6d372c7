//! Behaviour of the operational log facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use docapi::store::{CancelToken, Repository, StoreError, StoreResult};
use docapi::{DatabaseSettings, Log, LogLevel, LoggerService, Services};

#[tokio::test]
async fn test_log_persists_level_message_and_server_timestamp() {
    let services = Services::connect(&DatabaseSettings::in_memory()).unwrap();

    let before = Utc::now().timestamp();
    services.logger.log(LogLevel::Error, "boom").await.unwrap();
    let after = Utc::now().timestamp();

    let logs = services.logs.list(&CancelToken::new()).await.unwrap();
    assert_eq!(logs.len(), 1);
    let entry = &logs[0];
    assert_eq!(entry.level, LogLevel::Error);
    assert_eq!(entry.message, "boom");
    assert!(entry.id.is_some());
    assert!(
        (before..=after).contains(&entry.timestamp),
        "timestamp {} outside [{before}, {after}]",
        entry.timestamp
    );
}

#[tokio::test]
async fn test_each_call_writes_its_own_entry() {
    let services = Services::connect(&DatabaseSettings::in_memory()).unwrap();
    for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warning, LogLevel::Critical] {
        services.logger.log(level, format!("{level}")).await.unwrap();
    }

    let mut levels: Vec<LogLevel> = services
        .logs
        .list(&CancelToken::new())
        .await
        .unwrap()
        .into_iter()
        .map(|log| log.level)
        .collect();
    levels.sort();
    assert_eq!(
        levels,
        vec![LogLevel::Debug, LogLevel::Info, LogLevel::Warning, LogLevel::Critical]
    );
}

/// Log repository whose writes always fail.
#[derive(Default)]
struct UnwritableLogs {
    attempts: AtomicUsize,
}

#[async_trait]
impl Repository<Log> for UnwritableLogs {
    async fn list(&self, _: &CancelToken) -> StoreResult<Vec<Log>> {
        Ok(Vec::new())
    }
    async fn count(&self, _: &CancelToken) -> StoreResult<u64> {
        Ok(0)
    }
    async fn find_by_id(&self, _: &str, _: &CancelToken) -> StoreResult<Option<Log>> {
        Ok(None)
    }
    async fn create(&self, _: Log, _: &CancelToken) -> StoreResult<Log> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::backend("disk full"))
    }
    async fn update(&self, _: Log, _: &CancelToken) -> StoreResult<()> {
        Ok(())
    }
    async fn delete(&self, _: &str, _: &CancelToken) -> StoreResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_write_failures_reach_the_caller() {
    let logs = Arc::new(UnwritableLogs::default());
    let logger = LoggerService::new(logs.clone());

    let err = logger.log(LogLevel::Error, "boom").await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(ref msg) if msg == "disk full"));
    assert_eq!(logs.attempts.load(Ordering::SeqCst), 1);
}
