use docapi::DatabaseSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accepted values of the `X-Api-Key` header
    #[serde(default)]
    pub api_keys: HashSet<String>,

    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Compress responses
    #[serde(default = "default_true")]
    pub enable_compression: bool,

    /// Log level / `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Serve Prometheus metrics at `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Document store location and collection names
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Publishing integration credentials. Carried for the integration; the
    /// API itself never calls it.
    #[serde(default)]
    pub telegraph: Option<TelegraphSettings>,
}

/// Credentials for the Telegraph publishing integration.
#[derive(Clone, Deserialize, Serialize)]
pub struct TelegraphSettings {
    pub access_token: String,

    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub author_url: Option<String>,
}

impl fmt::Debug for TelegraphSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegraphSettings")
            .field("access_token", &"<redacted>")
            .field("author_name", &self.author_name)
            .field("author_url", &self.author_url)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            enable_compression: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            database: DatabaseSettings::default(),
            telegraph: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server` config file and
    /// `DOCAPI_SERVER__*` environment variables (later sources win).
    ///
    /// `DOCAPI_SERVER__API_KEYS` takes a comma separated list.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(
                config::Environment::with_prefix("DOCAPI_SERVER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api_keys")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Startup checks; a server without keys would reject every request.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_keys.is_empty() {
            anyhow::bail!("no API keys configured (set DOCAPI_SERVER__API_KEYS)");
        }
        if self.api_keys.iter().any(|key| key.trim().is_empty()) {
            anyhow::bail!("API keys must not be blank");
        }
        self.database.validate()?;
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Builder-style helper, mostly for tests and embedding.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.insert(key.into());
        self
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
