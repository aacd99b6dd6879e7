//! Policy server client
//!
//! Runs one access policy check: encode the request, exchange it with the
//! server, decode the verdict.

use crate::protocol::{Action, ActionTable, FieldTable, QueryEncoder, Verdict, VerdictDecoder};
use crate::transport::PolicyTransport;
use qpolicy_common::{Endpoint, PolicyRequest, Result};
use tracing::{debug, info, warn};

/// Policy check client
pub struct PolicyClient<T: PolicyTransport> {
    transport: T,
    endpoint: Endpoint,
    decoder: VerdictDecoder,
}

impl<T: PolicyTransport> PolicyClient<T> {
    /// Create a new client using the standard action table
    pub fn new(transport: T, endpoint: Endpoint) -> Self {
        Self::with_actions(transport, endpoint, ActionTable::standard())
    }

    /// Create a new client with a custom action table
    pub fn with_actions(transport: T, endpoint: Endpoint, actions: ActionTable) -> Self {
        Self {
            transport,
            endpoint,
            decoder: VerdictDecoder::new(actions),
        }
    }

    /// Ask the policy server about `request`
    pub async fn check(&self, request: &PolicyRequest) -> Result<Verdict> {
        let fields = FieldTable::from_request(request);
        let query = QueryEncoder::encode(&fields);

        debug!(
            "Sending {} byte policy query to {} (client {}, state {})",
            query.len(),
            self.endpoint,
            request.client_address,
            request.protocol_state
        );

        let response = self.transport.exchange(&self.endpoint, &query).await?;
        let verdict = self.decoder.decode(&response)?;

        match verdict.action {
            Action::Unknown => warn!(
                "Unrecognized policy server response: {:?}",
                String::from_utf8_lossy(&response)
            ),
            action => info!(
                "Policy server {} answered {} ({:?}){}",
                self.endpoint,
                verdict.word,
                action,
                verdict
                    .text
                    .as_deref()
                    .map(|text| format!(": {}", text))
                    .unwrap_or_default()
            ),
        }

        Ok(verdict)
    }
}
