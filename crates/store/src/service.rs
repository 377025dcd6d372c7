use crate::{
    new_document_id, CancelToken, Document, DocumentBackend, Keyed, StoreError, StoreResult,
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Uniform asynchronous CRUD contract over one document collection.
///
/// [`EntityService`] is the production implementation; collaborators that
/// only need persistence (the log facade, for instance) hold a
/// `dyn Repository<T>` so tests can swap in their own.
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    async fn list(&self, cancel: &CancelToken) -> StoreResult<Vec<T>>;

    async fn count(&self, cancel: &CancelToken) -> StoreResult<u64>;

    async fn find_by_id(&self, id: &str, cancel: &CancelToken) -> StoreResult<Option<T>>;

    async fn create(&self, value: T, cancel: &CancelToken) -> StoreResult<T>;

    async fn update(&self, value: T, cancel: &CancelToken) -> StoreResult<()>;

    async fn delete(&self, id: &str, cancel: &CancelToken) -> StoreResult<()>;
}

/// CRUD service for one entity type bound to one named collection.
///
/// Cloning is cheap and clones share the backend handle. Nothing is cached:
/// every call goes to the backend, on the blocking pool, racing `cancel`.
pub struct EntityService<T> {
    backend: Arc<dyn DocumentBackend>,
    collection: Arc<str>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityService<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            collection: Arc::clone(&self.collection),
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for EntityService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<T: Document> EntityService<T> {
    pub fn new(backend: Arc<dyn DocumentBackend>, collection: impl Into<String>) -> Self {
        let collection: String = collection.into();
        Self {
            backend,
            collection: Arc::from(collection),
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Every document in the collection, in no particular order.
    pub async fn list(&self, cancel: &CancelToken) -> StoreResult<Vec<T>> {
        self.run("list", cancel, |backend, collection| {
            let mut documents = Vec::new();
            backend.scan(collection, &mut |bytes| {
                documents.push(decode::<T>(bytes)?);
                Ok(ControlFlow::Continue(()))
            })?;
            Ok(documents)
        })
        .await
    }

    pub async fn count(&self, cancel: &CancelToken) -> StoreResult<u64> {
        self.run("count", cancel, |backend, collection| backend.count(collection))
            .await
    }

    pub async fn find_by_id(&self, id: &str, cancel: &CancelToken) -> StoreResult<Option<T>> {
        let id = id.to_string();
        self.run("find_by_id", cancel, move |backend, collection| {
            backend
                .get(collection, &id)?
                .map(|bytes| decode::<T>(&bytes))
                .transpose()
        })
        .await
    }

    /// Insert `value`, assigning a fresh identity when it has none. Returns
    /// the document as stored.
    pub async fn create(&self, mut value: T, cancel: &CancelToken) -> StoreResult<T> {
        let id = match value.id() {
            Some(id) => id.to_string(),
            None => {
                let id = new_document_id();
                value.set_id(id.clone());
                id
            }
        };
        let bytes = serde_json::to_vec(&value)?;
        self.run("create", cancel, move |backend, collection| {
            backend.insert(collection, &id, &bytes)
        })
        .await?;
        Ok(value)
    }

    /// Replace the stored document carrying `value`'s identity with `value`
    /// in full. Fields missing from `value` are gone afterwards.
    ///
    /// When no such document exists (or `value` has no identity) this is a
    /// no-op and still returns `Ok(())`.
    pub async fn update(&self, value: T, cancel: &CancelToken) -> StoreResult<()> {
        let Some(id) = value.id().map(str::to_string) else {
            tracing::debug!(collection = %self.collection, "update without identity ignored");
            return Ok(());
        };
        let bytes = serde_json::to_vec(&value)?;
        let target = id.clone();
        let matched = self
            .run("update", cancel, move |backend, collection| {
                backend.replace(collection, &target, &bytes)
            })
            .await?;
        if !matched {
            tracing::debug!(collection = %self.collection, id = %id, "update matched no document");
        }
        Ok(())
    }

    /// Remove the document with `id`. Absent documents are not an error.
    pub async fn delete(&self, id: &str, cancel: &CancelToken) -> StoreResult<()> {
        let id = id.to_string();
        self.run("delete", cancel, move |backend, collection| {
            backend.delete(collection, &id).map(|_| ())
        })
        .await
    }

    /// Run a blocking backend call, giving up as soon as `cancel` fires.
    async fn run<R, F>(&self, op: &'static str, cancel: &CancelToken, call: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&dyn DocumentBackend, &str) -> StoreResult<R> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let backend = Arc::clone(&self.backend);
        let collection = Arc::clone(&self.collection);
        let task = tokio::task::spawn_blocking(move || call(backend.as_ref(), &collection));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(collection = %self.collection, op, "store call cancelled");
                Err(StoreError::Cancelled)
            }
            joined = task => match joined {
                Ok(result) => result,
                Err(err) => Err(StoreError::backend(format!("{op} task failed: {err}"))),
            },
        }
    }
}

impl<T: Keyed> EntityService<T> {
    /// First document whose secondary key equals `key`. With duplicates,
    /// which one comes back is unspecified.
    pub async fn find_by_key(&self, key: T::Key, cancel: &CancelToken) -> StoreResult<Option<T>> {
        self.run("find_by_key", cancel, move |backend, collection| {
            let mut found = None;
            backend.scan(collection, &mut |bytes| {
                let document = decode::<T>(bytes)?;
                if document.key() == &key {
                    found = Some(document);
                    return Ok(ControlFlow::Break(()));
                }
                Ok(ControlFlow::Continue(()))
            })?;
            Ok(found)
        })
        .await
    }
}

#[async_trait]
impl<T: Document> Repository<T> for EntityService<T> {
    async fn list(&self, cancel: &CancelToken) -> StoreResult<Vec<T>> {
        EntityService::list(self, cancel).await
    }

    async fn count(&self, cancel: &CancelToken) -> StoreResult<u64> {
        EntityService::count(self, cancel).await
    }

    async fn find_by_id(&self, id: &str, cancel: &CancelToken) -> StoreResult<Option<T>> {
        EntityService::find_by_id(self, id, cancel).await
    }

    async fn create(&self, value: T, cancel: &CancelToken) -> StoreResult<T> {
        EntityService::create(self, value, cancel).await
    }

    async fn update(&self, value: T, cancel: &CancelToken) -> StoreResult<()> {
        EntityService::update(self, value, cancel).await
    }

    async fn delete(&self, id: &str, cancel: &CancelToken) -> StoreResult<()> {
        EntityService::delete(self, id, cancel).await
    }
}

fn decode<T: Document>(bytes: &[u8]) -> StoreResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}
