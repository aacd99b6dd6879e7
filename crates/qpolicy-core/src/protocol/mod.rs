//! Access policy delegation protocol
//!
//! Requests and responses are sequences of `name=value` lines ended by an
//! empty line. See Postfix SMTPD_POLICY_README for the attribute set.

mod encoder;
mod fields;
mod verdict;

pub use encoder::QueryEncoder;
pub use fields::{Field, FieldKey, FieldTable};
pub use verdict::{Action, ActionTable, Verdict, VerdictDecoder, MAX_ACTION_WORD_LEN};
