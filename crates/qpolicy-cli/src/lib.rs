//! qpolicy CLI - qmail front end to Postfix access policy servers
//!
//! [`run`] performs one policy check and returns the exit status the calling
//! MTA understands: 0 accept, 100 reject, 101 defer, 102 error.

pub mod invocation;
pub mod logging;

pub use invocation::{build_request, Cli, USAGE};
pub use logging::init_logging;

use qpolicy_common::{Config, Environment, Result};
use qpolicy_core::{PolicyClient, PolicyTransport, Verdict};
use std::future::Future;
use tracing::error;

/// Drive `future` to completion on a current-thread runtime
///
/// Blocking tasks still running afterwards, such as a stalled name lookup
/// abandoned by the connect deadline, are left behind instead of joined.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

/// Run one policy check
///
/// `make_transport` is only called once configuration and request facts are
/// complete, so an invocation error never opens a connection.
pub async fn run<E, T, F>(cli: &Cli, config: Result<Config>, env: &E, make_transport: F) -> u8
where
    E: Environment,
    T: PolicyTransport,
    F: FnOnce(&Config) -> T,
{
    match check(cli, config, env, make_transport).await {
        Ok(verdict) => verdict.action.exit_code(),
        Err(e) => {
            error!(code = e.code(), "{}", e);
            if e.is_usage() {
                eprintln!("{}", USAGE);
            }
            e.exit_code()
        }
    }
}

async fn check<E, T, F>(cli: &Cli, config: Result<Config>, env: &E, make_transport: F) -> Result<Verdict>
where
    E: Environment,
    T: PolicyTransport,
    F: FnOnce(&Config) -> T,
{
    let config = config?;
    let endpoint = config.server.endpoint()?;
    let request = build_request(cli, env, &config.request)?;

    let client = PolicyClient::new(make_transport(&config), endpoint);
    client.check(&request).await
}
