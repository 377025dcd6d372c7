//! Operational log facade.
//!
//! [`LoggerService::log`] is the single way the service records an
//! operational event in the log collection. The timestamp is taken here, at
//! call time, in UTC seconds.

use std::sync::Arc;

use chrono::Utc;
use store::{CancelToken, Repository, StoreResult};

use crate::models::{Log, LogLevel};

#[derive(Clone)]
pub struct LoggerService {
    logs: Arc<dyn Repository<Log>>,
}

impl LoggerService {
    pub fn new(logs: Arc<dyn Repository<Log>>) -> Self {
        Self { logs }
    }

    /// Persist a log entry and wait for the write.
    ///
    /// Write failures are returned to the caller, not swallowed. The entry is
    /// also emitted as a `tracing` event at the matching level.
    pub async fn log(&self, level: LogLevel, message: impl Into<String>) -> StoreResult<()> {
        let entry = Log {
            id: None,
            level,
            message: message.into(),
            timestamp: Utc::now().timestamp(),
        };
        trace_entry(&entry);

        // Never tied to a request's token: the entry lands even if the client
        // is gone.
        self.logs.create(entry, &CancelToken::new()).await?;
        Ok(())
    }
}

impl std::fmt::Debug for LoggerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerService").finish_non_exhaustive()
    }
}

fn trace_entry(entry: &Log) {
    let message = entry.message.as_str();
    match entry.level {
        LogLevel::Debug => tracing::debug!(target: "docapi::log", "{message}"),
        LogLevel::Info => tracing::info!(target: "docapi::log", "{message}"),
        LogLevel::Warning => tracing::warn!(target: "docapi::log", "{message}"),
        LogLevel::Error | LogLevel::Critical => {
            tracing::error!(target: "docapi::log", severity = %entry.level, "{message}")
        }
    }
}
