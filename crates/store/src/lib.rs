//! # docapi store
//!
//! Backend-agnostic document storage for the docapi service. Every entity
//! collection (users, logs, settings, stats, content records) goes through the
//! same small contract, so the HTTP layer never talks to a database directly.
//!
//! ## Core Pieces
//!
//! - **Pluggable Backends**: [`DocumentBackend`] stores opaque JSON documents
//!   keyed by document identity inside named collections. Out of the box:
//!   - An in-memory backend for tests and ephemeral deployments.
//!   - A redb backend for persistent, on-disk storage (enabled via the
//!     `backend-redb` feature, on by default).
//! - **Generic Entity Services**: [`EntityService<T>`] gives any
//!   [`Document`] type list / count / find / create / replace / delete over
//!   one collection. There is one instance per entity type, not one
//!   hand-written service per collection.
//! - **Cancellation**: every operation takes a [`CancelToken`]. When the
//!   token fires before the backend answers, the call resolves to
//!   [`StoreError::Cancelled`].
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use store::{BackendConfig, CancelToken, Document, EntityService};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Note {
//!     #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
//!     id: Option<String>,
//!     text: String,
//! }
//!
//! impl Document for Note {
//!     fn id(&self) -> Option<&str> {
//!         self.id.as_deref()
//!     }
//!     fn set_id(&mut self, id: String) {
//!         self.id = Some(id);
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap().block_on(async {
//! let backend = BackendConfig::in_memory().build().unwrap();
//! let notes: EntityService<Note> = EntityService::new(Arc::clone(&backend), "notes");
//! let cancel = CancelToken::new();
//!
//! let stored = notes
//!     .create(Note { id: None, text: "hello".into() }, &cancel)
//!     .await
//!     .unwrap();
//! let id = stored.id.clone().unwrap();
//! assert_eq!(notes.find_by_id(&id, &cancel).await.unwrap(), Some(stored));
//! # });
//! ```

mod backend;
mod cancel;
mod service;

pub use backend::{BackendConfig, DocumentBackend, InMemoryBackend, ScanVisitor};
#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use cancel::{CancelOnDrop, CancelToken};
pub use service::{EntityService, Repository};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by backends and entity services.
///
/// Everything except [`StoreError::Cancelled`] is a store fault: it travels
/// up unchanged to whoever is responsible for recovery.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document `{id}` already exists in collection `{collection}`")]
    DuplicateId { collection: String, id: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }

    /// True when the caller gave up, as opposed to the store failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }
}

/// A value that can live in a document collection.
///
/// The identity is `None` until the store assigns one on creation and never
/// changes afterwards.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);
}

/// A document with a type-specific secondary lookup key (for example an
/// external user id). Keys are not unique: lookups return the first match.
pub trait Keyed: Document {
    type Key: PartialEq + Send + Sync + 'static;

    fn key(&self) -> &Self::Key;
}

/// Fresh document identity: a v4 uuid in simple (32 hex chars) form.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
