//! qpolicy Core - access policy protocol and transport
//!
//! This crate encodes SMTP transaction facts for a Postfix-compatible policy
//! server, exchanges them over TCP under fixed deadlines, and decodes the
//! server's verdict into an [`Action`].

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::PolicyClient;
pub use protocol::{Action, ActionTable, FieldKey, FieldTable, QueryEncoder, Verdict, VerdictDecoder};
pub use transport::{PolicyTransport, TcpTransport, Timeouts};
