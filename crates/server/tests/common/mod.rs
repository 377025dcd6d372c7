//! Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use docapi::{DatabaseSettings, Services};
use http_body_util::BodyExt;
use server::{AppState, ServerConfig};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use store::{DocumentBackend, InMemoryBackend, ScanVisitor, StoreError, StoreResult};

pub const API_KEY: &str = "test-api-key";

/// How an instrumented collection behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Healthy,
    Failing,
    Slow(Duration),
}

/// In-memory backend that counts calls against selected collections and can
/// make them fail or stall. Other collections pass straight through.
pub struct InstrumentedBackend {
    inner: InMemoryBackend,
    watched: HashSet<String>,
    mode: Mode,
    calls: AtomicUsize,
}

impl InstrumentedBackend {
    pub fn new(watched: &[&str], mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryBackend::new(),
            watched: watched.iter().map(|c| c.to_string()).collect(),
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, collection: &str) -> StoreResult<()> {
        if !self.watched.contains(collection) {
            return Ok(());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::Healthy => Ok(()),
            Mode::Failing => Err(StoreError::backend("connection reset by peer")),
            Mode::Slow(delay) => {
                std::thread::sleep(delay);
                Ok(())
            }
        }
    }
}

impl DocumentBackend for InstrumentedBackend {
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<()> {
        self.enter(collection)?;
        self.inner.insert(collection, id, document)
    }

    fn replace(&self, collection: &str, id: &str, document: &[u8]) -> StoreResult<bool> {
        self.enter(collection)?;
        self.inner.replace(collection, id, document)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Vec<u8>>> {
        self.enter(collection)?;
        self.inner.get(collection, id)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.enter(collection)?;
        self.inner.delete(collection, id)
    }

    fn count(&self, collection: &str) -> StoreResult<u64> {
        self.enter(collection)?;
        self.inner.count(collection)
    }

    fn scan(&self, collection: &str, visitor: &mut ScanVisitor<'_>) -> StoreResult<()> {
        self.enter(collection)?;
        self.inner.scan(collection, visitor)
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig::default().with_api_key(API_KEY)
}

/// State over a plain in-memory store.
pub fn memory_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_config()).unwrap())
}

/// State over `backend` with default collection names.
pub fn state_with(backend: Arc<dyn DocumentBackend>) -> Arc<AppState> {
    let services = Services::with_backend(backend, &DatabaseSettings::default());
    Arc::new(AppState::with_services(test_config(), services))
}

pub fn request(method: Method, uri: &str, key: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
