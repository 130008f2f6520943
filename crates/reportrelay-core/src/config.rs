//! Configuration module
//!
//! Configuration is built once at startup from the environment (and an optional
//! `.env` file) and shared read-only by the scheduler, the upload client and
//! the HTTP handlers.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::models::ScheduleConfig;

const DEFAULT_BASE_URL: &str = "https://reports.pirelli.ru/local/templates/dealer/ajax/api.php";
const DEFAULT_COMPANY_NAME: &str = "SEMISOTNOV";
const DEFAULT_AUTH_LOGIN: &str = "5700097";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_UPLOAD_TIME: &str = "09:00";
const DEFAULT_UPLOAD_DAY: i32 = 1;
const DEFAULT_CSV_FILE_PATH: &str = "./report.csv";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const HTTP_CONCURRENCY_LIMIT: usize = 1_000;

/// How much of the validator runs on each upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Size, emptiness, executable signature and pattern blacklist.
    #[default]
    Standard,
    /// Everything in `Standard` plus record-level structural limits.
    Strict,
}

impl FromStr for ValidationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "default" => Ok(ValidationMode::Standard),
            "strict" => Ok(ValidationMode::Strict),
            other => Err(anyhow::anyhow!(
                "VALIDATION_MODE must be 'standard' or 'strict', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Standard => f.write_str("standard"),
            ValidationMode::Strict => f.write_str("strict"),
        }
    }
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `compact` (default) or `json`
    pub log_format: String,
    /// In-flight request cap for the HTTP router (at least 1)
    pub http_concurrency_limit: usize,
}

/// Relay configuration: remote endpoint, credentials, schedule and limits.
#[derive(Clone)]
pub struct RelayConfig {
    pub base: BaseConfig,
    pub base_url: String,
    pub company_name: String,
    pub auth_login: String,
    pub auth_token: String,
    pub admin_password: String,
    // Scheduler
    pub upload_time: String,
    pub upload_day: i32,
    pub csv_file_path: String,
    // Upload client
    pub request_timeout_secs: u64,
    // Validator
    pub max_file_size_bytes: usize,
    pub validation_mode: ValidationMode,
    // Web form
    pub templates_dir: String,
    pub static_dir: String,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("base", &self.base)
            .field("base_url", &self.base_url)
            .field("company_name", &self.company_name)
            .field("auth_login", &self.auth_login)
            .field("auth_token", &"[REDACTED]")
            .field("admin_password", &"[REDACTED]")
            .field("upload_time", &self.upload_time)
            .field("upload_day", &self.upload_day)
            .field("csv_file_path", &self.csv_file_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .field("validation_mode", &self.validation_mode)
            .field("templates_dir", &self.templates_dir)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: parse_or(
                env::var("SERVER_PORT").or_else(|_| env::var("PORT")).ok(),
                DEFAULT_SERVER_PORT,
            ),
            cors_origins,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
            http_concurrency_limit: parse_or(
                env::var("HTTP_CONCURRENCY_LIMIT").ok(),
                HTTP_CONCURRENCY_LIMIT,
            )
            .max(1),
        };

        let max_file_size_mb = parse_or(env::var("MAX_FILE_SIZE_MB").ok(), MAX_FILE_SIZE_MB);

        let validation_mode = match env::var("VALIDATION_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => ValidationMode::default(),
        };

        Ok(RelayConfig {
            base,
            base_url: env_or("BASE_URL", DEFAULT_BASE_URL),
            company_name: env_or("COMPANY_NAME", DEFAULT_COMPANY_NAME),
            auth_login: env_or("AUTH_LOGIN", DEFAULT_AUTH_LOGIN),
            auth_token: env::var("AUTH_TOKEN")
                .map_err(|_| anyhow::anyhow!("AUTH_TOKEN must be set for the remote endpoint"))?,
            admin_password: env_or("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
            // An explicitly empty UPLOAD_TIME disables the scheduler.
            upload_time: env::var("UPLOAD_TIME").unwrap_or_else(|_| DEFAULT_UPLOAD_TIME.to_string()),
            upload_day: parse_or(env::var("UPLOAD_DAY").ok(), DEFAULT_UPLOAD_DAY),
            csv_file_path: env_or("CSV_FILE_PATH", DEFAULT_CSV_FILE_PATH),
            request_timeout_secs: parse_or(
                env::var("REQUEST_TIMEOUT_SECS").ok(),
                REQUEST_TIMEOUT_SECS,
            ),
            max_file_size_bytes: megabytes_to_bytes(max_file_size_mb),
            validation_mode,
            templates_dir: env_or("TEMPLATES_DIR", "templates"),
            static_dir: env_or("STATIC_DIR", "static"),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("BASE_URL is not a valid URL: {}", e))?;

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.auth_login.trim().is_empty() || self.auth_token.trim().is_empty() {
            return Err(anyhow::anyhow!("AUTH_LOGIN and AUTH_TOKEN must not be empty"));
        }

        if is_production(&self.base.environment) && self.admin_password == DEFAULT_ADMIN_PASSWORD {
            return Err(anyhow::anyhow!(
                "ADMIN_PASSWORD must be changed from the default in production"
            ));
        }

        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a numeric variable; missing or unparseable values use `default`.
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn megabytes_to_bytes(mb: usize) -> usize {
    mb.checked_mul(1024 * 1024)
        .unwrap_or(MAX_FILE_SIZE_MB * 1024 * 1024)
}

fn is_production(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<RelayConfig>);

impl Config {
    pub fn new(config: RelayConfig) -> Self {
        Config(Box::new(config))
    }

    fn as_relay(&self) -> &RelayConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = RelayConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_relay().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production(&self.as_relay().base.environment)
    }

    /// Scheduler settings, or `None` when automatic uploads are disabled
    /// (empty `UPLOAD_TIME` or `UPLOAD_DAY` outside 0..=6).
    ///
    /// The time string is not parsed here: an unparseable value still starts the
    /// scheduler, which logs and retries instead of aborting the process.
    pub fn schedule(&self) -> Option<ScheduleConfig> {
        let relay = self.as_relay();
        if relay.upload_time.trim().is_empty() {
            return None;
        }
        let weekday = u8::try_from(relay.upload_day).ok()?;
        ScheduleConfig::new(relay.upload_time.clone(), weekday).ok()
    }

    pub fn server_port(&self) -> u16 {
        self.as_relay().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_relay().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_relay().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_relay().base.log_format
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_relay().base.http_concurrency_limit.max(1)
    }

    pub fn base_url(&self) -> &str {
        &self.as_relay().base_url
    }

    pub fn company_name(&self) -> &str {
        &self.as_relay().company_name
    }

    pub fn auth_login(&self) -> &str {
        &self.as_relay().auth_login
    }

    pub fn auth_token(&self) -> &str {
        &self.as_relay().auth_token
    }

    pub fn admin_password(&self) -> &str {
        &self.as_relay().admin_password
    }

    pub fn csv_file_path(&self) -> &str {
        &self.as_relay().csv_file_path
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.as_relay().request_timeout_secs)
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_relay().max_file_size_bytes
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.as_relay().validation_mode
    }

    pub fn templates_dir(&self) -> &str {
        &self.as_relay().templates_dir
    }

    pub fn static_dir(&self) -> &str {
        &self.as_relay().static_dir
    }
}
