//! Command line and environment handling
//!
//! qmail runs the helper once per SMTP event. Session facts arrive in the
//! environment; older setups pass sender, recipient and HELO as arguments.

use clap::Parser;
use qpolicy_common::config::RequestConfig;
use qpolicy_common::env::{
    AUTH_USER, HELO, RCPTCOUNT, RECIPIENT, SENDER, SESSIONID, SIZE, SMTPSTATE, TCPREMOTEHOST,
    TCPREMOTEIP,
};
use qpolicy_common::{Environment, Error, PolicyRequest, Result};

pub const USAGE: &str = "usage:  qenvscan-policyd [mailfrom.s addr.s [helohost.s]]";

/// Ask a Postfix access policy server whether to accept a message
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "qenvscan-policyd", version, override_usage = "qenvscan-policyd [MAILFROM ADDR [HELOHOST]]")]
pub struct Cli {
    /// Envelope sender, overrides SENDER
    #[arg(value_name = "MAILFROM", allow_hyphen_values = true)]
    pub sender: Option<String>,

    /// Envelope recipient, overrides RECIPIENT
    #[arg(value_name = "ADDR", allow_hyphen_values = true)]
    pub recipient: Option<String>,

    /// HELO hostname, overrides HELO
    #[arg(value_name = "HELOHOST", allow_hyphen_values = true)]
    pub helo: Option<String>,
}

impl Cli {
    pub fn new(sender: &str, recipient: &str, helo: Option<&str>) -> Self {
        Self {
            sender: Some(sender.to_string()),
            recipient: Some(recipient.to_string()),
            helo: helo.map(str::to_string),
        }
    }
}

/// Collect the request facts for this invocation
pub fn build_request(
    cli: &Cli,
    env: &impl Environment,
    config: &RequestConfig,
) -> Result<PolicyRequest> {
    let client_address = env
        .var(TCPREMOTEIP)
        .ok_or_else(|| Error::Config(format!("{} not set", TCPREMOTEIP)))?;
    let client_name = env
        .var(TCPREMOTEHOST)
        .unwrap_or_else(|| client_address.clone());

    let (sender, recipient) = match (&cli.sender, &cli.recipient) {
        (Some(sender), Some(recipient)) => (Some(sender.clone()), Some(recipient.clone())),
        (None, None) => (env.var(SENDER), env.var(RECIPIENT)),
        _ => {
            return Err(Error::Config(
                "expected both mailfrom and addr arguments".to_string(),
            ))
        }
    };
    let helo = cli.helo.clone().or_else(|| env.var(HELO));

    let protocol_state = env
        .var(SMTPSTATE)
        .unwrap_or_else(|| config.protocol_state.clone());

    let sasl_username = env.var(AUTH_USER);
    let sasl_method = sasl_username
        .as_ref()
        .map(|_| config.sasl_method.clone());

    let mut request = PolicyRequest::new(
        config.protocol_name.clone(),
        protocol_state,
        client_address,
        client_name,
    )
    .with_envelope(sender, recipient)
    .with_helo(helo)
    .with_sasl(sasl_method, sasl_username);

    request.instance = env.var(SESSIONID);
    request.size = env.var(SIZE);
    request.recipient_count = env.var(RCPTCOUNT);

    Ok(request)
}
