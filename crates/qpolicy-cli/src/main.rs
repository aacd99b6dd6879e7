//! qenvscan-policyd - qmail front end to Postfix access policy servers

use clap::Parser;
use qpolicy_cli::{block_on, init_logging, run, Cli};
use qpolicy_common::config::LoggingConfig;
use qpolicy_common::{Config, ProcessEnvironment, EXIT_ERROR};
use qpolicy_core::{TcpTransport, Timeouts};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let env = ProcessEnvironment;
    let config = Config::load(&env);

    // Initialize logging
    let fallback = LoggingConfig::default();
    let logging = config.as_ref().map(|c| &c.logging).unwrap_or(&fallback);
    if let Err(e) = init_logging(logging) {
        eprintln!("qenvscan-policyd: {:#}", e);
        let _ = init_logging(&fallback);
    }

    let check = run(&cli, config, &env, |config| {
        TcpTransport::new(Timeouts::from_config(&config.server))
    });

    match block_on(check) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
