//! Startup wiring: one backend handle, one entity service per collection.

use std::sync::Arc;

use store::{BackendConfig, DocumentBackend, EntityService, StoreResult};

use crate::config::DatabaseSettings;
use crate::logger::LoggerService;
use crate::models::{Doujin, Log, Setting, Stats, User};

/// Handles to every collection, built once at startup and passed to request
/// handlers explicitly. Clones share the same backend.
#[derive(Clone)]
pub struct Services {
    pub users: EntityService<User>,
    pub logs: EntityService<Log>,
    pub settings: EntityService<Setting>,
    pub stats: EntityService<Stats>,
    pub doujins: EntityService<Doujin>,
    pub logger: LoggerService,
    backend: Arc<dyn DocumentBackend>,
}

impl Services {
    /// Open the store named by `settings` and bind every collection.
    pub fn connect(settings: &DatabaseSettings) -> StoreResult<Self> {
        let backend = BackendConfig::from_connection_string(&settings.connection_string)?.build()?;
        tracing::info!(
            database = %settings.database_name,
            "document store opened"
        );
        Ok(Self::with_backend(backend, settings))
    }

    /// Bind every collection of `settings` on an already opened backend.
    pub fn with_backend(backend: Arc<dyn DocumentBackend>, settings: &DatabaseSettings) -> Self {
        let logs: EntityService<Log> = EntityService::new(
            Arc::clone(&backend),
            settings.qualified(&settings.logs_collection_name),
        );
        Self {
            users: EntityService::new(
                Arc::clone(&backend),
                settings.qualified(&settings.users_collection_name),
            ),
            settings: EntityService::new(
                Arc::clone(&backend),
                settings.qualified(&settings.settings_collection_name),
            ),
            stats: EntityService::new(
                Arc::clone(&backend),
                settings.qualified(&settings.stats_collection_name),
            ),
            doujins: EntityService::new(
                Arc::clone(&backend),
                settings.qualified(&settings.doujins_collection_name),
            ),
            logger: LoggerService::new(Arc::new(logs.clone())),
            logs,
            backend,
        }
    }

    /// Flush the backend before the process exits.
    pub fn close(&self) -> StoreResult<()> {
        self.backend.flush()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("users", &self.users)
            .field("logs", &self.logs)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .field("doujins", &self.doujins)
            .finish_non_exhaustive()
    }
}
