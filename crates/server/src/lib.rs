//! docapi server - authenticated REST API over the docapi collections
//!
//! Every request passes through an explicit pipeline (see [`pipeline`]):
//! API key authentication, a per-request cancellation scope, then fault
//! translation, which turns store errors and handler panics into JSON error
//! responses and records them in the log collection.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! All endpoints require the `X-Api-Key` header.
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /metrics` - Prometheus metrics
//! - `/api/v1/{users,logs,settings,stats,doujins}` - CRUD, see [`routes::entities`]

pub mod config;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ServerConfig, TelegraphSettings};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::AppState;
