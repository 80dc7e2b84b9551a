use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Partner API credential triple. All three values are required for the API
/// source to be available; `crate::config` rejects a partially set triple.
#[derive(Clone, PartialEq, Eq)]
pub struct PaapiCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub partner_tag: String,
}

impl std::fmt::Debug for PaapiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaapiCredentials")
            .field("access_key", &"[redacted]")
            .field("secret_key", &"[redacted]")
            .field("partner_tag", &self.partner_tag)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub marketplace: String,
    pub locale: String,
    pub paapi_credentials: Option<PaapiCredentials>,
    pub paapi_base_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_concurrent: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
    pub retry_base_secs: u64,
    pub search_limit: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("marketplace", &self.marketplace)
            .field("locale", &self.locale)
            .field("database_url", &"[redacted]")
            .field("paapi_credentials", &self.paapi_credentials)
            .field("paapi_base_url", &self.paapi_base_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_concurrent", &self.max_concurrent)
            .field("min_delay_ms", &self.min_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_base_secs", &self.retry_base_secs)
            .field("search_limit", &self.search_limit)
            .finish()
    }
}
