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

pub const DEFAULT_EVALUATOR_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_EVALUATOR_MODEL: &str = "claude-sonnet-4-20250514";

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub evaluator: EvaluatorConfig,
}

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
        let data_dir = env::var("APP_DATA_DIR").unwrap_or_else(|_| "data".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig {
                dir: PathBuf::from(data_dir),
            },
            evaluator: EvaluatorConfig::from_env()?,
        })
    }
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the static assessment dataset.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub dir: PathBuf,
}

/// Connection settings for the upstream impact evaluator.
#[derive(Clone)]
pub struct EvaluatorConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub retry_transient: bool,
}

impl EvaluatorConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let api_url =
            env::var("APP_EVALUATOR_URL").unwrap_or_else(|_| DEFAULT_EVALUATOR_URL.to_string());
        let model =
            env::var("APP_EVALUATOR_MODEL").unwrap_or_else(|_| DEFAULT_EVALUATOR_MODEL.to_string());

        let max_tokens = env::var("APP_EVALUATOR_MAX_TOKENS")
            .unwrap_or_else(|_| "1024".to_string())
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidMaxTokens)?;

        let timeout_secs = env::var("APP_EVALUATOR_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let retry_transient = parse_flag(
            "APP_EVALUATOR_RETRY",
            &env::var("APP_EVALUATOR_RETRY").unwrap_or_else(|_| "true".to_string()),
        )?;

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            timeout: Duration::from_secs(timeout_secs),
            retry_transient,
        })
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_EVALUATOR_URL.to_string(),
            api_key: None,
            model: DEFAULT_EVALUATOR_MODEL.to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(30),
            retry_transient: true,
        }
    }
}

impl fmt::Debug for EvaluatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("retry_transient", &self.retry_transient)
            .finish()
    }
}

fn parse_flag(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { variable }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMaxTokens,
    InvalidTimeout,
    InvalidFlag { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMaxTokens => {
                write!(f, "APP_EVALUATOR_MAX_TOKENS must be a positive integer")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "APP_EVALUATOR_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidFlag { variable } => {
                write!(f, "{variable} must be true or false")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
