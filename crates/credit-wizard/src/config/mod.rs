use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REQUEST_DELAY_MS: u64 = 2_000;
const DEFAULT_CLARIFICATION_DELAY_MS: u64 = 4_000;
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

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
    pub wizard: WizardConfig,
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

        let request_delay = delay_from_env("WIZARD_REQUEST_DELAY_MS", DEFAULT_REQUEST_DELAY_MS)?;
        let clarification_delay = delay_from_env(
            "WIZARD_CLARIFICATION_DELAY_MS",
            DEFAULT_CLARIFICATION_DELAY_MS,
        )?;
        let report_path = env::var("WIZARD_REPORT_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let session_ttl = match env::var("WIZARD_SESSION_TTL_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidSessionTtl),
            },
            Err(_) => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            wizard: WizardConfig {
                request_delay,
                clarification_delay,
                report_path,
                session_ttl,
            },
        })
    }
}

fn delay_from_env(variable: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDelay { variable }),
        Err(_) => Ok(Duration::from_millis(default_ms)),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Simulated processing latency and the report handed out after clarifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    pub request_delay: Duration,
    pub clarification_delay: Duration,
    /// JSON score report replacing the built-in one.
    pub report_path: Option<PathBuf>,
    /// Hosted sessions idle for longer than this are dropped.
    pub session_ttl: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            clarification_delay: Duration::from_millis(DEFAULT_CLARIFICATION_DELAY_MS),
            report_path: None,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDelay { variable: &'static str },
    InvalidSessionTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDelay { variable } => {
                write!(f, "{variable} must be a whole number of milliseconds")
            }
            ConfigError::InvalidSessionTtl => {
                write!(f, "WIZARD_SESSION_TTL_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidDelay { .. }
            | ConfigError::InvalidSessionTtl => None,
            ConfigError::InvalidHost { source } => Some(source),
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("WIZARD_REQUEST_DELAY_MS");
        env::remove_var("WIZARD_CLARIFICATION_DELAY_MS");
        env::remove_var("WIZARD_REPORT_PATH");
        env::remove_var("WIZARD_SESSION_TTL_SECS");
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
        assert_eq!(config.wizard, WizardConfig::default());
        assert_eq!(config.wizard.request_delay, Duration::from_secs(2));
        assert_eq!(config.wizard.clarification_delay, Duration::from_secs(4));
        assert_eq!(config.wizard.session_ttl, Duration::from_secs(1_800));
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
    fn reads_wizard_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WIZARD_REQUEST_DELAY_MS", "0");
        env::set_var("WIZARD_CLARIFICATION_DELAY_MS", " 250 ");
        env::set_var("WIZARD_REPORT_PATH", "/tmp/report.json");
        env::set_var("WIZARD_SESSION_TTL_SECS", "90");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.wizard.request_delay, Duration::ZERO);
        assert_eq!(config.wizard.clarification_delay, Duration::from_millis(250));
        assert_eq!(
            config.wizard.report_path,
            Some(PathBuf::from("/tmp/report.json"))
        );
        assert_eq!(config.wizard.session_ttl, Duration::from_secs(90));
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WIZARD_CLARIFICATION_DELAY_MS", "soon");
        let error = AppConfig::load().expect_err("delay must be numeric");
        assert!(matches!(
            error,
            ConfigError::InvalidDelay {
                variable: "WIZARD_CLARIFICATION_DELAY_MS"
            }
        ));
        reset_env();
    }

    #[test]
    fn rejects_zero_session_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WIZARD_SESSION_TTL_SECS", "0");
        let error = AppConfig::load().expect_err("ttl must be positive");
        assert!(matches!(error, ConfigError::InvalidSessionTtl));
        reset_env();
    }
}
