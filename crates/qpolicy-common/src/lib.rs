//! qpolicy Common - Shared types and configuration
//!
//! This crate provides configuration, the error taxonomy, environment access
//! and the typed request facts shared by all qpolicy components.

pub mod config;
pub mod env;
pub mod error;
pub mod types;

pub use config::Config;
pub use env::{Environment, ProcessEnvironment};
pub use error::{Error, Result, EXIT_ACCEPT, EXIT_DEFER, EXIT_ERROR, EXIT_REJECT};
pub use types::{Endpoint, PolicyRequest};
