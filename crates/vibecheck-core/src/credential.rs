//! Explicit request credentials.
//!
//! Every call against the orchestrating service takes a `&Credential` instead of
//! reading ambient process state. Transfers to storage never carry one: the ticket
//! is the only authorization they need.

use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Authentication attached to a single request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    ApiKey(String),
    /// No authentication header.
    Anonymous,
}

impl Credential {
    /// Header name and value for this credential, if any.
    pub fn header(&self) -> Option<(&'static str, String)> {
        match self {
            Credential::Bearer(token) => Some(("Authorization", format!("Bearer {}", token))),
            Credential::ApiKey(key) => Some(("X-API-Key", key.clone())),
            Credential::Anonymous => None,
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Credential::Bearer(_) => f.write_str("Credential::Bearer(<redacted>)"),
            Credential::ApiKey(_) => f.write_str("Credential::ApiKey(<redacted>)"),
            Credential::Anonymous => f.write_str("Credential::Anonymous"),
        }
    }
}
