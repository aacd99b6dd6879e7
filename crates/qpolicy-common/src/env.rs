//! Process environment access
//!
//! qmail hands the SMTP session facts to its helpers through environment
//! variables. Reading them through [`Environment`] keeps the rest of the
//! program free of ambient global state and lets tests supply a plain map.

use std::collections::HashMap;

/// Server host name or address
pub const POLICYD_SERVER: &str = "POLICYD_SERVER";
/// Server TCP port
pub const POLICYD_PORT: &str = "POLICYD_PORT";
/// Connect timeout in seconds
pub const POLICYD_TIMEOUT: &str = "POLICYD_TIMEOUT";
/// Reply timeout in seconds
pub const POLICYD_REPLY_TIMEOUT: &str = "POLICYD_REPLY_TIMEOUT";
/// Optional TOML configuration file
pub const POLICYD_CONFIG: &str = "POLICYD_CONFIG";
/// Log filter directive
pub const POLICYD_LOG: &str = "POLICYD_LOG";

pub const TCPREMOTEIP: &str = "TCPREMOTEIP";
pub const TCPREMOTEHOST: &str = "TCPREMOTEHOST";
pub const SENDER: &str = "SENDER";
pub const RECIPIENT: &str = "RECIPIENT";
pub const HELO: &str = "HELO";
pub const SIZE: &str = "SIZE";
pub const RCPTCOUNT: &str = "RCPTCOUNT";
pub const SESSIONID: &str = "SESSIONID";
pub const SMTPSTATE: &str = "SMTPSTATE";
pub const AUTH_USER: &str = "AUTH_USER";

/// Read-only view of environment variables
pub trait Environment {
    /// Returns the value of `key`, or `None` when it is not set
    ///
    /// A variable set to the empty string is present and yields `Some("")`.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Environment for HashMap<&str, &str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.to_string())
    }
}
