//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a
//! `.env` file) once at startup and validated before anything else runs.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_SCANNER_URL: &str = "https://bfa.srnd.net/upload";
const DEFAULT_SCANNER_USER_AGENT: &str = "MUS Forwarder";

/// Console log format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_format: LogFormat,
}

/// Gateway configuration: scan endpoint and bucket settings
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base: BaseConfig,
    // Scan endpoint
    pub scanner_url: String,
    pub scanner_user_agent: String,
    pub scanner_timeout_secs: Option<u64>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (R2, MinIO, ...)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GatewayConfig>);

impl Config {
    fn as_gateway(&self) -> &GatewayConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = GatewayConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_gateway().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_gateway().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.as_gateway().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_gateway().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_gateway().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_gateway().base.log_format
    }

    pub fn scanner_url(&self) -> &str {
        &self.as_gateway().scanner_url
    }

    pub fn scanner_user_agent(&self) -> &str {
        &self.as_gateway().scanner_user_agent
    }

    pub fn scanner_timeout(&self) -> Option<Duration> {
        self.as_gateway()
            .scanner_timeout_secs
            .map(Duration::from_secs)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_gateway().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_gateway().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_gateway().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_gateway().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_gateway().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_gateway().local_storage_path.as_deref()
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format: LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default()),
        };

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let scanner_timeout_secs = match non_empty("SCANNER_TIMEOUT_SECS") {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("SCANNER_TIMEOUT_SECS must be a valid number"))?,
            ),
            None => None,
        };

        let config = GatewayConfig {
            base,
            scanner_url: non_empty("SCANNER_URL").unwrap_or_else(|| DEFAULT_SCANNER_URL.to_string()),
            scanner_user_agent: non_empty("SCANNER_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_SCANNER_USER_AGENT.to_string()),
            scanner_timeout_secs,
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.scanner_url.starts_with("https://") || self.scanner_url.starts_with("http://")) {
            return Err(anyhow::anyhow!(
                "SCANNER_URL must be an http(s) URL, got '{}'",
                self.scanner_url
            ));
        }

        if self.scanner_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!(
                "SCANNER_TIMEOUT_SECS must be greater than zero when set"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}
