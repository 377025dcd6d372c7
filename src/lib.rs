//! Domain crate for docapi: the entities the API serves, the per-collection
//! services that persist them, and the operational log facade.
//!
//! Storage mechanics live in the `store` crate; the HTTP pipeline lives in
//! the `server` crate. This crate ties the two together so callers hold a
//! single [`Services`] value built at startup.
//!
//! ```
//! use docapi::{DatabaseSettings, LogLevel, Services, User};
//! use docapi::store::CancelToken;
//!
//! # tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap().block_on(async {
//! let services = Services::connect(&DatabaseSettings::in_memory()).unwrap();
//! let cancel = CancelToken::new();
//!
//! let user = services.users.create(User::new(42), &cancel).await.unwrap();
//! assert_eq!(services.users.find_by_key(42, &cancel).await.unwrap(), Some(user));
//!
//! services.logger.log(LogLevel::Info, "user registered").await.unwrap();
//! assert_eq!(services.logs.count(&cancel).await.unwrap(), 1);
//! # });
//! ```

pub mod config;
pub mod logger;
pub mod models;
pub mod services;

pub use config::{ConfigLoadError, DatabaseSettings};
pub use logger::LoggerService;
pub use models::{Doujin, Log, LogLevel, Setting, Source, Stats, User};
pub use services::Services;

pub use store;
