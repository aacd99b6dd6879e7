//! Policy server transport
//!
//! One request/response exchange per call. [`TcpTransport`] talks to a real
//! server; tests substitute their own [`PolicyTransport`].

mod tcp;

pub use tcp::{TcpTransport, Timeouts, MIN_RESPONSE_BUFFER};

use async_trait::async_trait;
use qpolicy_common::{Endpoint, Result};

/// Sends one encoded query and returns the raw reply
#[async_trait]
pub trait PolicyTransport: Send + Sync {
    /// Exchange `query` with the server at `endpoint`
    async fn exchange(&self, endpoint: &Endpoint, query: &[u8]) -> Result<Vec<u8>>;
}
