//! Policy query encoding
//!
//! A query is one `name=value` line per populated attribute followed by an
//! empty line that ends the request.

use super::fields::FieldTable;

/// Serializes a [`FieldTable`] into the wire format
pub struct QueryEncoder;

impl QueryEncoder {
    /// Exact size of the encoded query
    pub fn encoded_len(table: &FieldTable) -> usize {
        table.iter().map(|field| field.encoded_len()).sum::<usize>() + 1
    }

    /// Encode the populated fields of `table`
    pub fn encode(table: &FieldTable) -> Vec<u8> {
        let len = Self::encoded_len(table);
        let mut query = Vec::with_capacity(len);

        for field in table.populated() {
            if let Some(value) = &field.value {
                query.extend_from_slice(field.key.as_str().as_bytes());
                query.push(b'=');
                query.extend_from_slice(value.as_bytes());
                query.push(b'\n');
            }
        }
        query.push(b'\n');

        debug_assert_eq!(query.len(), len);
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qpolicy_common::PolicyRequest;

    fn request() -> PolicyRequest {
        PolicyRequest::new("SMTP", "RCPT", "1.2.3.4", "1.2.3.4").with_envelope(
            Some("foo@bar.tld".to_string()),
            Some("bar@foo.tld".to_string()),
        )
    }

    #[test]
    fn test_encode_query() {
        let table = FieldTable::from_request(&request().with_helo(Some("some.domain.tld".to_string())));
        let query = QueryEncoder::encode(&table);

        assert_eq!(
            String::from_utf8(query).unwrap(),
            "request=smtpd_access_policy\n\
             protocol_name=SMTP\n\
             protocol_state=RCPT\n\
             client_address=1.2.3.4\n\
             client_name=1.2.3.4\n\
             sender=foo@bar.tld\n\
             recipient=bar@foo.tld\n\
             helo_name=some.domain.tld\n\
             \n"
        );
    }

    #[test]
    fn test_absent_helo_is_skipped() {
        let table = FieldTable::from_request(&request());
        let query = String::from_utf8(QueryEncoder::encode(&table)).unwrap();

        assert!(!query.contains("helo_name"));
        assert!(query.ends_with("recipient=bar@foo.tld\n\n"));
    }

    #[test]
    fn test_empty_value_is_sent() {
        let request = request().with_envelope(Some(String::new()), Some("bar@foo.tld".to_string()));
        let table = FieldTable::from_request(&request);
        let query = String::from_utf8(QueryEncoder::encode(&table)).unwrap();

        assert!(query.contains("\nsender=\n"));
    }

    #[test]
    fn test_line_count_and_length() {
        let mut request = request();
        request.instance = Some("4F2A.1".to_string());
        request.size = Some("12345".to_string());
        request.sasl_method = Some("plain".to_string());
        request.sasl_username = Some("you".to_string());

        let table = FieldTable::from_request(&request);
        let populated = table.populated().count();
        let query = QueryEncoder::encode(&table);

        assert_eq!(query.len(), QueryEncoder::encoded_len(&table));
        let text = String::from_utf8(query).unwrap();
        let lines: Vec<&str> = text.split_terminator('\n').collect();
        assert_eq!(lines.len(), populated + 1);
        assert_eq!(lines.last(), Some(&""));
        assert!(lines[..populated].iter().all(|line| line.contains('=')));
        assert_eq!(lines[populated - 1], "sasl_username=you");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let table = FieldTable::from_request(&request());
        assert_eq!(QueryEncoder::encode(&table), QueryEncoder::encode(&table));
    }
}
