//! Common types used across qpolicy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of the `request` attribute for SMTP access policy delegation
pub const ACCESS_POLICY_REQUEST: &str = "smtpd_access_policy";

/// Policy server address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// SMTP transaction facts sent to the policy server
///
/// Built once from the environment and command line; never mutated after
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequest {
    /// Protocol name (SMTP or ESMTP)
    pub protocol_name: String,
    /// SMTP state the check is made in (RCPT, DATA, ...)
    pub protocol_state: String,
    /// Client IP address
    pub client_address: String,
    /// Client host name, or the address when unknown
    pub client_name: String,
    /// Envelope sender (MAIL FROM), empty for bounces
    pub sender: Option<String>,
    /// Envelope recipient (RCPT TO)
    pub recipient: Option<String>,
    /// HELO/EHLO hostname
    pub helo_name: Option<String>,
    /// Session identifier shared by all checks of one message
    pub instance: Option<String>,
    /// Message size in bytes, as announced by the client
    pub size: Option<String>,
    /// Number of accepted recipients
    pub recipient_count: Option<String>,
    /// SASL mechanism, when the session authenticated
    pub sasl_method: Option<String>,
    /// SASL user name, when the session authenticated
    pub sasl_username: Option<String>,
}

impl PolicyRequest {
    /// Create a request for a client with the minimum set of facts
    pub fn new(
        protocol_name: impl Into<String>,
        protocol_state: impl Into<String>,
        client_address: impl Into<String>,
        client_name: impl Into<String>,
    ) -> Self {
        Self {
            protocol_name: protocol_name.into(),
            protocol_state: protocol_state.into(),
            client_address: client_address.into(),
            client_name: client_name.into(),
            sender: None,
            recipient: None,
            helo_name: None,
            instance: None,
            size: None,
            recipient_count: None,
            sasl_method: None,
            sasl_username: None,
        }
    }

    /// Set the envelope sender and recipient
    pub fn with_envelope(mut self, sender: Option<String>, recipient: Option<String>) -> Self {
        self.sender = sender;
        self.recipient = recipient;
        self
    }

    /// Set the HELO hostname
    pub fn with_helo(mut self, helo_name: Option<String>) -> Self {
        self.helo_name = helo_name;
        self
    }

    /// Set the SASL identity
    pub fn with_sasl(mut self, method: Option<String>, username: Option<String>) -> Self {
        self.sasl_method = method;
        self.sasl_username = username;
        self
    }
}
