//! TCP transport
//!
//! Resolve, connect under a deadline, write the query, read one reply chunk,
//! shut down. The stream lives inside [`TcpTransport::exchange`] so it is
//! closed on every return path.

use super::PolicyTransport;

use async_trait::async_trait;
use qpolicy_common::config::ServerConfig;
use qpolicy_common::{Endpoint, Error, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, warn};

/// Smallest reply buffer allocated for a response
pub const MIN_RESPONSE_BUFFER: usize = 4096;

/// Deadlines for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Resolve and connect
    pub connect: Duration,
    /// Send the query and read the reply
    pub reply: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            reply: Duration::from_secs(10),
        }
    }
}

impl Timeouts {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            reply: config.reply_timeout(),
        }
    }
}

/// Plain TCP transport, one connection per exchange
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    timeouts: Timeouts,
}

impl TcpTransport {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    async fn connect(endpoint: &Endpoint) -> Result<TcpStream> {
        let addr = resolve(endpoint).await?;
        debug!("Connecting to policy server {} ({})", endpoint, addr);

        TcpStream::connect(addr)
            .await
            .map_err(|source| Error::Connect {
                addr: endpoint.to_string(),
                source,
            })
    }

    async fn send_and_receive(
        stream: &mut TcpStream,
        endpoint: &Endpoint,
        query: &[u8],
    ) -> Result<Vec<u8>> {
        stream
            .write_all(query)
            .await
            .map_err(|source| Error::Send {
                addr: endpoint.to_string(),
                source,
            })?;
        stream.flush().await.map_err(|source| Error::Send {
            addr: endpoint.to_string(),
            source,
        })?;

        let mut response = vec![0u8; response_buffer_len(query.len())];
        let n = stream
            .read(&mut response)
            .await
            .map_err(|e| Error::NoResponse {
                addr: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        if n == 0 {
            return Err(Error::NoResponse {
                addr: endpoint.to_string(),
                reason: "connection closed without a reply".to_string(),
            });
        }

        response.truncate(n);
        debug!("Received {} bytes from policy server {}", n, endpoint);
        Ok(response)
    }
}

#[async_trait]
impl PolicyTransport for TcpTransport {
    async fn exchange(&self, endpoint: &Endpoint, query: &[u8]) -> Result<Vec<u8>> {
        let mut stream =
            connect_within(endpoint, self.timeouts.connect, Self::connect(endpoint)).await?;

        let result = match tokio::time::timeout(
            self.timeouts.reply,
            Self::send_and_receive(&mut stream, endpoint, query),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::ReplyTimeout {
                addr: endpoint.to_string(),
                timeout: self.timeouts.reply,
            }),
        };

        if let Err(e) = stream.shutdown().await {
            debug!("Shutdown of policy server connection failed: {}", e);
        }

        result
    }
}

/// Run `connect` under a one-shot deadline
///
/// The deadline is owned by this call and is gone once it returns.
async fn connect_within<F, S>(endpoint: &Endpoint, limit: Duration, connect: F) -> Result<S>
where
    F: Future<Output = Result<S>>,
{
    match tokio::time::timeout(limit, connect).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Connect to policy server {} timed out after {:?}", endpoint, limit);
            Err(Error::ConnectTimeout {
                addr: endpoint.to_string(),
                timeout: limit,
            })
        }
    }
}

/// First address for `endpoint`, IPv4 preferred
async fn resolve(endpoint: &Endpoint) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = lookup_host((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(|e| Error::AddressResolution {
            host: endpoint.host.clone(),
            reason: e.to_string(),
        })?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| Error::AddressResolution {
            host: endpoint.host.clone(),
            reason: "no addresses found".to_string(),
        })
}

/// Reply buffer size; never smaller than the query it answers
fn response_buffer_len(query_len: usize) -> usize {
    query_len.max(MIN_RESPONSE_BUFFER)
}
