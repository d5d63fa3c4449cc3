use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./data | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP port |
/// | DATABASE_PATH | `<WORK_DIR>/catalog.db` | SQLite database file |
/// | DB_MAX_CONNECTIONS | 5 | Pool size |
/// | DB_ACQUIRE_TIMEOUT_MS | 5000 | Pool acquire timeout (milliseconds) |
/// | MAX_CONNECTIONS | 1000 | Concurrent in-flight requests |
/// | REQUEST_TIMEOUT_MS | 30000 | Request timeout (milliseconds) |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | unset | Daily rolling log directory |
/// | ENVIRONMENT | development | development, staging or production |
/// | SEED_DEMO_DATA | false | Load the demo catalog into an empty database |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/catalog HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory, holds the database and logs
    pub work_dir: String,
    pub http_port: u16,
    /// Overrides `<work_dir>/catalog.db`
    pub database_path: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_ms: u64,
    /// Concurrent in-flight request limit
    pub max_connections: usize,
    pub request_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
    pub seed_demo_data: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            database_path: std::env::var("DATABASE_PATH").ok(),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5),
            db_acquire_timeout_ms: env_or("DB_ACQUIRE_TIMEOUT_MS", 5000),
            max_connections: env_or("MAX_CONNECTIONS", 1000),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            seed_demo_data: env_or("SEED_DEMO_DATA", false),
        }
    }

    /// Override the working directory and port, mostly for tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.database_path = None;
        config
    }

    /// Resolved SQLite file path
    pub fn database_path(&self) -> String {
        match &self.database_path {
            Some(path) => path.clone(),
            None => PathBuf::from(&self.work_dir)
                .join("catalog.db")
                .to_string_lossy()
                .into_owned(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
