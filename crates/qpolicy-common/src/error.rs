//! Error types for qpolicy

use std::time::Duration;
use thiserror::Error;

/// Exit status: accept the message
pub const EXIT_ACCEPT: u8 = 0;

/// Exit status: permanent rejection
pub const EXIT_REJECT: u8 = 100;

/// Exit status: temporary failure (defer / greylist)
pub const EXIT_DEFER: u8 = 101;

/// Exit status: internal, protocol or configuration error
pub const EXIT_ERROR: u8 = 102;

/// Main error type for qpolicy
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to resolve policy server address {host}: {reason}")]
    AddressResolution { host: String, reason: String },

    #[error("Timed out after {timeout:?} connecting to policy server {addr}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Failed to connect to policy server {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send policy query to {addr}: {source}")]
    Send {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No response from policy server {addr}: {reason}")]
    NoResponse { addr: String, reason: String },

    #[error("Policy server {addr} did not reply within {timeout:?}")]
    ReplyTimeout { addr: String, timeout: Duration },

    #[error("Malformed policy server response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for qpolicy
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the process exit status for this error
    ///
    /// Every failure is terminal and reported to the MTA as an internal
    /// error; none of them is allowed to look like an accept or a reject.
    pub fn exit_code(&self) -> u8 {
        EXIT_ERROR
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::AddressResolution { .. } => "ADDRESS_RESOLUTION_FAILED",
            Error::ConnectTimeout { .. } => "CONNECT_TIMEOUT",
            Error::Connect { .. } => "CONNECT_FAILED",
            Error::Send { .. } => "SEND_FAILED",
            Error::NoResponse { .. } => "NO_RESPONSE",
            Error::ReplyTimeout { .. } => "REPLY_TIMEOUT",
            Error::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }

    /// Whether the error stems from how the program was invoked
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
