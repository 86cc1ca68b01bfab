use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub review: ReviewConfig,
    pub notifier: NotifierConfig,
    pub storage: StorageConfig,
}

const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 5;

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw)?,
            Err(_) => LogFormat::Compact,
        };

        let reviewers = env::var("APP_REVIEWERS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        let owners = env::var("APP_REVIEW_OWNER")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let webhook_url = env::var("APP_WEBHOOK_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let webhook_timeout = match env::var("APP_WEBHOOK_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => DEFAULT_WEBHOOK_TIMEOUT_SECS,
        };

        let store_path = env::var("APP_STORE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            review: ReviewConfig { reviewers, owners },
            notifier: NotifierConfig {
                webhook_url,
                timeout: Duration::from_secs(webhook_timeout),
            },
            storage: StorageConfig { store_path },
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Output style for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Applicant keys allowed to use the review endpoints. Owners may also manage reviewers.
#[derive(Debug, Clone, Default)]
pub struct ReviewConfig {
    pub reviewers: Vec<String>,
    pub owners: Vec<String>,
}

/// Submission webhook settings. No URL means notifications are off.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub timeout: Duration,
}

/// Where applications are kept. No path means the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub store_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidLogFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "APP_WEBHOOK_TIMEOUT_SECS must be a positive whole number")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidLogFormat(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "APP_REVIEWERS",
            "APP_REVIEW_OWNER",
            "APP_WEBHOOK_URL",
            "APP_WEBHOOK_TIMEOUT_SECS",
            "APP_STORE_PATH",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert!(config.review.reviewers.is_empty());
        assert!(config.review.owners.is_empty());
        assert!(config.notifier.webhook_url.is_none());
        assert_eq!(config.notifier.timeout, Duration::from_secs(5));
        assert!(config.storage.store_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn parses_reviewers_webhook_and_store() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REVIEWERS", "beegboss1919#0, ,mod@example.com");
        env::set_var("APP_REVIEW_OWNER", " beegboss1919#0 ");
        env::set_var("APP_WEBHOOK_URL", " https://hooks.example.test/abc ");
        env::set_var("APP_WEBHOOK_TIMEOUT_SECS", "12");
        env::set_var("APP_STORE_PATH", "/var/lib/mod-intake/applications.json");
        env::set_var("APP_LOG_FORMAT", "JSON");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.review.reviewers,
            vec!["beegboss1919#0".to_string(), "mod@example.com".to_string()]
        );
        assert_eq!(config.review.owners, vec!["beegboss1919#0".to_string()]);
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://hooks.example.test/abc")
        );
        assert_eq!(config.notifier.timeout, Duration::from_secs(12));
        assert_eq!(
            config.storage.store_path,
            Some(PathBuf::from("/var/lib/mod-intake/applications.json"))
        );
        assert_eq!(config.telemetry.format, LogFormat::Json);
        reset_env();
    }

    #[test]
    fn rejects_zero_webhook_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_WEBHOOK_TIMEOUT_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTimeout)
        ));
        reset_env();
    }

    #[test]
    fn rejects_unknown_log_format() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_FORMAT", "xml");
        match AppConfig::load() {
            Err(ConfigError::InvalidLogFormat(value)) => assert_eq!(value, "xml"),
            other => panic!("expected log format error, got {other:?}"),
        }
        reset_env();
    }
}
