//! Policy server verdicts
//!
//! The server answers with attribute lines of which only `action=` matters.
//! The action word is looked up in an [`ActionTable`] and the resulting
//! [`Action`] decides the exit status handed back to the MTA.

use qpolicy_common::error::{EXIT_ACCEPT, EXIT_DEFER, EXIT_ERROR, EXIT_REJECT};
use qpolicy_common::{Error, Result};

/// Longest action word considered
pub const MAX_ACTION_WORD_LEN: usize = 31;

const ACTION_PREFIX: &[u8] = b"action=";

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Deliver the message
    Allow,
    /// Reject permanently
    PermFail,
    /// Defer (greylisting)
    TempFail,
    /// Unrecognized answer
    Unknown,
}

impl Action {
    /// Process exit status for this action
    pub fn exit_code(self) -> u8 {
        match self {
            Action::Allow => EXIT_ACCEPT,
            Action::PermFail => EXIT_REJECT,
            Action::TempFail => EXIT_DEFER,
            Action::Unknown => EXIT_ERROR,
        }
    }
}

/// Ordered mapping from action words to actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    rules: Vec<(String, Action)>,
    default: Action,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionTable {
    /// Table for Postfix-compatible policy servers
    pub fn standard() -> Self {
        Self::new(
            [
                ("DEFER_IF_PERMIT", Action::TempFail),
                ("DEFER", Action::TempFail),
                ("REJECT_IF_PERMIT", Action::PermFail),
                ("REJECT", Action::PermFail),
                ("DUNNO", Action::Allow),
                ("OK", Action::Allow),
            ],
            Action::Unknown,
        )
    }

    /// Build a table from `(word, action)` rules and a fallback action
    pub fn new<'a>(rules: impl IntoIterator<Item = (&'a str, Action)>, default: Action) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(word, action)| (word.to_string(), action))
                .collect(),
            default,
        }
    }

    /// Action for `word`; first case-insensitive whole-word match wins
    ///
    /// Three-digit `4NN`/`5NN` words map to defer and reject like the SMTP
    /// reply codes they carry.
    pub fn lookup(&self, word: &str) -> Action {
        if let Some((_, action)) = self
            .rules
            .iter()
            .find(|(rule, _)| rule.eq_ignore_ascii_case(word))
        {
            return *action;
        }

        match word.as_bytes() {
            [b'4', b'0'..=b'9', b'0'..=b'9'] => Action::TempFail,
            [b'5', b'0'..=b'9', b'0'..=b'9'] => Action::PermFail,
            _ => self.default,
        }
    }

    /// Fallback for unmatched words
    pub fn default_action(&self) -> Action {
        self.default
    }
}

/// Decoded server answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub action: Action,
    /// Action word as sent by the server
    pub word: String,
    /// Free text following the word, if any
    pub text: Option<String>,
}

/// Extracts verdicts from server responses
pub struct VerdictDecoder {
    table: ActionTable,
}

impl VerdictDecoder {
    pub fn new(table: ActionTable) -> Self {
        Self { table }
    }

    /// Decode a raw response
    pub fn decode(&self, response: &[u8]) -> Result<Verdict> {
        let start = find_action(response).ok_or_else(|| {
            Error::MalformedResponse(format!(
                "no action attribute in {:?}",
                String::from_utf8_lossy(response)
            ))
        })?;

        let rest = &response[start..];
        let word_len = rest
            .iter()
            .take(MAX_ACTION_WORD_LEN + 1)
            .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_')
            .count();

        // Never match on a truncated prefix of an oversized word.
        let word = String::from_utf8_lossy(&rest[..word_len]).into_owned();
        let action = if word.is_empty() || word_len > MAX_ACTION_WORD_LEN {
            self.table.default_action()
        } else {
            self.table.lookup(&word)
        };

        let line_end = rest
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(rest.len());
        let text = String::from_utf8_lossy(&rest[word_len..line_end])
            .trim()
            .to_string();

        Ok(Verdict {
            action,
            word,
            text: (!text.is_empty()).then_some(text),
        })
    }
}

/// Offset just past the first line that starts with `action=`
fn find_action(response: &[u8]) -> Option<usize> {
    let mut line_start = 0;
    for line in response.split(|&b| b == b'\n') {
        if line.starts_with(ACTION_PREFIX) {
            return Some(line_start + ACTION_PREFIX.len());
        }
        line_start += line.len() + 1;
    }
    None
}
