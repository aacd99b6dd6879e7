//! Configuration for qpolicy
//!
//! Settings come from an optional TOML file named by `POLICYD_CONFIG`, then
//! the environment the MTA passes to the helper overrides them.

use crate::env::{
    Environment, POLICYD_CONFIG, POLICYD_LOG, POLICYD_PORT, POLICYD_REPLY_TIMEOUT, POLICYD_SERVER,
    POLICYD_TIMEOUT,
};
use crate::types::Endpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Policy server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Fixed request attributes
    #[serde(default)]
    pub request: RequestConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Policy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or IP address
    pub host: Option<String>,

    /// TCP port
    pub port: Option<u16>,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Timeout for sending the query and reading the reply, in milliseconds
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            connect_timeout_ms: default_connect_timeout(),
            reply_timeout_ms: default_reply_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_reply_timeout() -> u64 {
    10_000
}

impl ServerConfig {
    /// Resolved policy server endpoint
    pub fn endpoint(&self) -> crate::Result<Endpoint> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| crate::Error::Config(format!("{} not set", POLICYD_SERVER)))?;
        let port = self
            .port
            .ok_or_else(|| crate::Error::Config(format!("{} not set", POLICYD_PORT)))?;

        Ok(Endpoint::new(host, port))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Fixed attributes of every policy request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Value of `protocol_name`
    #[serde(default = "default_protocol_name")]
    pub protocol_name: String,

    /// Value of `protocol_state` unless `SMTPSTATE` is set
    #[serde(default = "default_protocol_state")]
    pub protocol_state: String,

    /// Value of `sasl_method` for authenticated sessions
    #[serde(default = "default_sasl_method")]
    pub sasl_method: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            protocol_name: default_protocol_name(),
            protocol_state: default_protocol_state(),
            sasl_method: default_sasl_method(),
        }
    }
}

fn default_protocol_name() -> String {
    "SMTP".to_string()
}

fn default_protocol_state() -> String {
    "RCPT".to_string()
}

fn default_sasl_method() -> String {
    "plain".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the optional file, then apply the environment
    pub fn load(env: &impl Environment) -> crate::Result<Self> {
        let mut config = match env.var(POLICYD_CONFIG) {
            Some(path) => {
                debug!("Loading configuration from {}", path);
                Self::from_file(std::path::Path::new(&path))?
            }
            None => Self::default(),
        };

        config.apply_env(env)?;
        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Environment) -> crate::Result<()> {
        if let Some(host) = env.var(POLICYD_SERVER) {
            self.server.host = Some(host);
        }
        if let Some(port) = env.var(POLICYD_PORT) {
            self.server.port = Some(parse_port(&port)?);
        }
        if let Some(secs) = env.var(POLICYD_TIMEOUT) {
            self.server.connect_timeout_ms = parse_timeout_secs(POLICYD_TIMEOUT, &secs)?;
        }
        if let Some(secs) = env.var(POLICYD_REPLY_TIMEOUT) {
            self.server.reply_timeout_ms = parse_timeout_secs(POLICYD_REPLY_TIMEOUT, &secs)?;
        }
        if let Some(level) = env.var(POLICYD_LOG) {
            self.logging.level = level;
        }
        Ok(())
    }
}

/// Parse a port number the way `strtol(value, &end, 0)` reads it
///
/// Accepts decimal, `0x`-prefixed hexadecimal and `0`-prefixed octal. The
/// whole value must be consumed and fit in 0..=65535.
pub fn parse_port(value: &str) -> crate::Result<u16> {
    let invalid = || {
        crate::Error::Config(format!(
            "invalid {} port number: {:?}",
            POLICYD_PORT, value
        ))
    };

    let trimmed = value.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    u16::from_str_radix(digits, radix).map_err(|_| invalid())
}

fn parse_timeout_secs(name: &str, value: &str) -> crate::Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs.saturating_mul(1000)),
        _ => Err(crate::Error::Config(format!(
            "invalid {} value {:?}: expected a positive number of seconds",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, None);
        assert_eq!(config.server.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.server.reply_timeout(), Duration::from_secs(10));
        assert_eq!(config.request.protocol_state, "RCPT");
        assert_eq!(config.request.sasl_method, "plain");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_from_environment() {
        let env = HashMap::from([
            (POLICYD_SERVER, "127.0.0.1"),
            (POLICYD_PORT, "10023"),
            (POLICYD_TIMEOUT, "3"),
        ]);

        let config = Config::load(&env).unwrap();
        assert_eq!(
            config.server.endpoint().unwrap(),
            Endpoint::new("127.0.0.1", 10023)
        );
        assert_eq!(config.server.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.server.reply_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_server_or_port_is_config_error() {
        let env = HashMap::from([(POLICYD_SERVER, "127.0.0.1")]);
        let config = Config::load(&env).unwrap();
        let err = config.server.endpoint().unwrap_err();
        assert!(err.to_string().contains("POLICYD_PORT not set"));

        let env = HashMap::from([(POLICYD_PORT, "10023")]);
        let config = Config::load(&env).unwrap();
        let err = config.server.endpoint().unwrap_err();
        assert!(err.to_string().contains("POLICYD_SERVER not set"));
    }

    #[test]
    fn test_non_numeric_port_is_config_error() {
        let env = HashMap::from([(POLICYD_SERVER, "127.0.0.1"), (POLICYD_PORT, "postgrey")]);
        let err = Config::load(&env).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("10023").unwrap(), 10023);
        assert_eq!(parse_port("0x2733").unwrap(), 10035);
        assert_eq!(parse_port("010").unwrap(), 8);
        assert_eq!(parse_port("0").unwrap(), 0);
        assert_eq!(parse_port(" +25").unwrap(), 25);

        assert!(parse_port("").is_err());
        assert!(parse_port("10023x").is_err());
        assert!(parse_port("70000").is_err());
        assert!(parse_port("-1").is_err());
        assert!(parse_port("0x").is_err());
        assert!(parse_port("09").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let env = HashMap::from([(POLICYD_TIMEOUT, "0")]);
        assert!(Config::load(&env).is_err());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
host = "policy.example.com"
port = 10023
reply_timeout_ms = 2500

[request]
protocol_name = "ESMTP"

[logging]
format = "json"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host.as_deref(), Some("policy.example.com"));
        assert_eq!(config.server.port, Some(10023));
        assert_eq!(config.server.connect_timeout_ms, 10_000);
        assert_eq!(config.server.reply_timeout_ms, 2500);
        assert_eq!(config.request.protocol_name, "ESMTP");
        assert_eq!(config.request.protocol_state, "RCPT");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qpolicy.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"policy.example.com\"\nport = 10023\n",
        )
        .unwrap();

        let path = path.to_string_lossy().into_owned();
        let env = HashMap::from([(POLICYD_CONFIG, path.as_str()), (POLICYD_PORT, "12525")]);

        let config = Config::load(&env).unwrap();
        assert_eq!(
            config.server.endpoint().unwrap(),
            Endpoint::new("policy.example.com", 12525)
        );
    }

    #[test]
    fn test_unreadable_config_file() {
        let env = HashMap::from([(POLICYD_CONFIG, "/nonexistent/qpolicy.toml")]);
        let err = Config::load(&env).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
