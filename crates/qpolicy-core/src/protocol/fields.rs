//! Policy request attributes
//!
//! Defines the attributes sent to the policy server and their canonical
//! order on the wire.

use qpolicy_common::types::{PolicyRequest, ACCESS_POLICY_REQUEST};

/// Policy request attribute name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// request - always `smtpd_access_policy`
    Request,
    /// protocol_name - SMTP or ESMTP
    ProtocolName,
    /// protocol_state - SMTP command the check belongs to
    ProtocolState,
    /// client_address - remote IP
    ClientAddress,
    /// client_name - remote host name
    ClientName,
    /// sender - MAIL FROM
    Sender,
    /// recipient - RCPT TO
    Recipient,
    /// helo_name - HELO/EHLO argument
    HeloName,
    /// instance - per-message session identifier
    Instance,
    /// size - announced message size
    Size,
    /// recipient_count
    RecipientCount,
    /// sasl_method
    SaslMethod,
    /// sasl_username
    SaslUsername,
}

impl FieldKey {
    /// All attributes in wire order
    pub const ALL: [FieldKey; 13] = [
        FieldKey::Request,
        FieldKey::ProtocolName,
        FieldKey::ProtocolState,
        FieldKey::ClientAddress,
        FieldKey::ClientName,
        FieldKey::Sender,
        FieldKey::Recipient,
        FieldKey::HeloName,
        FieldKey::Instance,
        FieldKey::Size,
        FieldKey::RecipientCount,
        FieldKey::SaslMethod,
        FieldKey::SaslUsername,
    ];

    /// Wire name of the attribute
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKey::Request => "request",
            FieldKey::ProtocolName => "protocol_name",
            FieldKey::ProtocolState => "protocol_state",
            FieldKey::ClientAddress => "client_address",
            FieldKey::ClientName => "client_name",
            FieldKey::Sender => "sender",
            FieldKey::Recipient => "recipient",
            FieldKey::HeloName => "helo_name",
            FieldKey::Instance => "instance",
            FieldKey::Size => "size",
            FieldKey::RecipientCount => "recipient_count",
            FieldKey::SaslMethod => "sasl_method",
            FieldKey::SaslUsername => "sasl_username",
        }
    }

    /// Byte length of the wire name
    pub const fn key_len(self) -> usize {
        self.as_str().len()
    }
}

/// One attribute and its optional value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: FieldKey,
    pub value: Option<String>,
}

impl Field {
    /// Bytes this field occupies in a query, 0 when it has no value
    pub fn encoded_len(&self) -> usize {
        match &self.value {
            // key '=' value '\n'
            Some(value) => self.key.key_len() + 1 + value.len() + 1,
            None => 0,
        }
    }
}

/// Attributes of one policy request in canonical order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    fields: Vec<Field>,
}

impl FieldTable {
    /// Build the table for a request
    pub fn from_request(request: &PolicyRequest) -> Self {
        let fields = FieldKey::ALL
            .iter()
            .map(|&key| {
                let value = match key {
                    FieldKey::Request => Some(ACCESS_POLICY_REQUEST.to_string()),
                    FieldKey::ProtocolName => Some(request.protocol_name.clone()),
                    FieldKey::ProtocolState => Some(request.protocol_state.clone()),
                    FieldKey::ClientAddress => Some(request.client_address.clone()),
                    FieldKey::ClientName => Some(request.client_name.clone()),
                    FieldKey::Sender => request.sender.clone(),
                    FieldKey::Recipient => request.recipient.clone(),
                    FieldKey::HeloName => request.helo_name.clone(),
                    FieldKey::Instance => request.instance.clone(),
                    FieldKey::Size => request.size.clone(),
                    FieldKey::RecipientCount => request.recipient_count.clone(),
                    FieldKey::SaslMethod => request.sasl_method.clone(),
                    FieldKey::SaslUsername => request.sasl_username.clone(),
                };
                Field { key, value }
            })
            .collect();

        Self { fields }
    }

    /// All fields, populated or not
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Fields that carry a value, in order
    pub fn populated(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.value.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value(table: &FieldTable, key: FieldKey) -> Option<&str> {
        table
            .iter()
            .find(|field| field.key == key)
            .and_then(|field| field.value.as_deref())
    }

    #[test]
    fn test_table_follows_canonical_order() {
        let request = PolicyRequest::new("SMTP", "RCPT", "1.2.3.4", "1.2.3.4");
        let table = FieldTable::from_request(&request);

        let keys: Vec<FieldKey> = table.iter().map(|field| field.key).collect();
        assert_eq!(keys, FieldKey::ALL.to_vec());
    }

    #[test]
    fn test_populated_skips_absent_values() {
        let request = PolicyRequest::new("SMTP", "RCPT", "1.2.3.4", "mx.example.net")
            .with_envelope(Some(String::new()), Some("bar@foo.tld".to_string()));
        let table = FieldTable::from_request(&request);

        let names: Vec<&str> = table.populated().map(|field| field.key.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "request",
                "protocol_name",
                "protocol_state",
                "client_address",
                "client_name",
                "sender",
                "recipient",
            ]
        );
        assert_eq!(value(&table, FieldKey::Request), Some("smtpd_access_policy"));
        assert_eq!(value(&table, FieldKey::Sender), Some(""));
        assert_eq!(value(&table, FieldKey::HeloName), None);
    }

    #[test]
    fn test_field_encoded_len() {
        let field = Field {
            key: FieldKey::HeloName,
            value: Some("some.domain.tld".to_string()),
        };
        assert_eq!(field.encoded_len(), "helo_name=some.domain.tld\n".len());

        let absent = Field {
            key: FieldKey::HeloName,
            value: None,
        };
        assert_eq!(absent.encoded_len(), 0);
    }
}
