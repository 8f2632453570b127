//! Application configuration
//!
//! Layered loading: `config.toml` (optional) overridden by environment
//! variables with the `SG` prefix and `__` separator, e.g.
//! `SG__SERVER__PORT=9999` or `SG__GATE__FORCE_CHALLENGE=true`.

use serde::{Deserialize, Serialize};

/// Static configuration loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority: ENV > config.toml > defaults.
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SG")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<AppConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend kind: sqlite, mysql, postgres, mariadb.
    #[serde(default = "default_db_backend")]
    pub backend: String,
    #[serde(default = "default_db_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_db_backend(),
            url: default_db_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign the session cookie. Empty means a random secret
    /// is generated at startup (sessions do not survive restarts).
    #[serde(default)]
    pub secret: String,
    /// Idle expiry for server-side session state, in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Upper bound on concurrently tracked sessions. Least-recently-used
    /// entries are evicted past this point.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Attempts within the window at which the rate signal fires.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,
    /// Sliding window length for attempt tracking, in seconds.
    #[serde(default = "default_rate_window")]
    pub rate_window_secs: u64,
    /// Probability (0.0..=1.0) of challenging an otherwise clean request.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Challenge every request regardless of signals. Diagnostic mode.
    #[serde(default)]
    pub force_challenge: bool,
    /// Minimum trust score for admission when the provider reports one.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window(),
            sample_rate: default_sample_rate(),
            force_challenge: false,
            score_threshold: default_score_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Shared secret for the verification provider.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
    /// Upper bound on the outbound verification call, in seconds.
    #[serde(default = "default_captcha_timeout")]
    pub timeout_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            verify_url: default_verify_url(),
            timeout_secs: default_captcha_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. None or empty means stdout.
    #[serde(default)]
    pub file: Option<String>,
    /// "json" or "plain".
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            format: default_log_format(),
            enable_rotation: true,
            max_backups: default_max_backups(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_backend() -> String {
    "sqlite".to_string()
}

fn default_db_url() -> String {
    "sqlite://shortgate.db?mode=rwc".to_string()
}

fn default_session_ttl() -> u64 {
    86400
}

fn default_max_sessions() -> u64 {
    100_000
}

fn default_rate_limit() -> usize {
    8
}

fn default_rate_window() -> u64 {
    60
}

fn default_sample_rate() -> f64 {
    0.08
}

fn default_score_threshold() -> f64 {
    0.55
}

fn default_verify_url() -> String {
    "https://api.hcaptcha.com/siteverify".to_string()
}

fn default_captcha_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_backups() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.gate.rate_limit, 8);
        assert_eq!(config.gate.rate_window_secs, 60);
        assert!((config.gate.sample_rate - 0.08).abs() < f64::EPSILON);
        assert!(!config.gate.force_challenge);
        assert!((config.gate.score_threshold - 0.55).abs() < f64::EPSILON);
        assert_eq!(config.session.ttl_secs, 86400);
        assert_eq!(config.session.max_sessions, 100_000);
        assert_eq!(config.captcha.timeout_secs, 5);
    }
}
