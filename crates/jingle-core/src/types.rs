//! Core types for jingle-core
//!
//! Identifiers, per-call states and the already-parsed signaling events the
//! call-control layer consumes and produces. Content payloads (media
//! description, transport candidates) are carried through untouched; this
//! layer never interprets them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Optional headers attached to an outbound session-initiate
pub type Headers = HashMap<String, String>;

/// Session identifier correlating every signaling event of one call
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of a signaling endpoint, `user@domain/resource`
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct EndpointId(pub String);

impl EndpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity with any `/resource` suffix stripped
    pub fn bare(&self) -> &str {
        match self.0.split_once('/') {
            Some((bare, _)) => bare,
            None => &self.0,
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-SID call state as seen by the call-control layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// session-initiate sent, awaiting accept or terminate
    PendingOut,
    /// session-initiate received, awaiting local disposition
    PendingIn,
    /// Accept processed
    Active,
    /// Terminal; the SID is no longer registered
    Terminated,
}

impl CallState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, CallState::Terminated)
    }
}

/// Signaling action carried by an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Initiate,
    Accept,
    Terminate,
    Info,
    /// Any action the call-control layer does not handle (transport-info, ...)
    Other(String),
}

impl Action {
    pub const SESSION_INITIATE: &'static str = "session-initiate";
    pub const SESSION_ACCEPT: &'static str = "session-accept";
    pub const SESSION_TERMINATE: &'static str = "session-terminate";
    pub const SESSION_INFO: &'static str = "session-info";

    /// Map a wire action name onto an [`Action`]
    pub fn from_name(name: &str) -> Self {
        match name {
            Self::SESSION_INITIATE => Action::Initiate,
            Self::SESSION_ACCEPT => Action::Accept,
            Self::SESSION_TERMINATE => Action::Terminate,
            Self::SESSION_INFO => Action::Info,
            other => Action::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Action::Initiate => Self::SESSION_INITIATE,
            Action::Accept => Self::SESSION_ACCEPT,
            Action::Terminate => Self::SESSION_TERMINATE,
            Action::Info => Self::SESSION_INFO,
            Action::Other(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stanza type of the message carrying a signaling event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StanzaKind {
    Get,
    Set,
    Result,
    Error,
}

impl StanzaKind {
    /// Requests need exactly one acknowledgement; results and errors are responses
    pub fn is_request(&self) -> bool {
        matches!(self, StanzaKind::Get | StanzaKind::Set)
    }
}

/// Which parties send media for a content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Senders {
    Initiator,
    Responder,
    Both,
    None,
}

/// A codec offered in a media description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadType {
    pub id: u8,
    pub name: String,
    pub clockrate: u32,
}

/// Locally generated media description of a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub media: String,
    pub payload_types: Vec<PayloadType>,
}

/// A transport candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub component: u8,
    pub generation: u32,
    pub ip: String,
    pub port: u16,
}

/// Transport parameters of a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportInfo {
    pub candidates: Vec<Candidate>,
}

/// Negotiation payload exchanged in initiate/accept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub creator: String,
    pub name: String,
    pub senders: Senders,
    pub description: Description,
    pub transport: TransportInfo,
}

/// Cause code attached to a terminate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCondition {
    Success,
    Busy,
    Decline,
    Cancel,
    Timeout,
    ConnectivityError,
    FailedApplication,
    GeneralError,
}

/// Structured reason of a session-terminate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub condition: ReasonCondition,
    pub text: Option<String>,
}

impl Reason {
    pub fn new(condition: ReasonCondition) -> Self {
        Self {
            condition,
            text: None,
        }
    }

    pub fn success() -> Self {
        Self::new(ReasonCondition::Success)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// An already-parsed signaling event
///
/// Produced by the signaling gateway for inbound traffic and by this crate
/// for outbound traffic. The call-control layer never mutates an event it
/// received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalingEvent {
    /// Stanza id, echoed by the acknowledgement
    pub id: String,
    pub kind: StanzaKind,
    pub action: Action,
    pub sid: SessionId,
    pub from: EndpointId,
    pub to: EndpointId,
    pub content: Option<Content>,
    pub reason: Option<Reason>,
    /// Ringing indicator of a session-info
    pub ringing: bool,
    pub headers: Headers,
}

impl SignalingEvent {
    /// Build a request (`set`) event with a freshly generated stanza id
    pub fn request(action: Action, sid: SessionId, from: EndpointId, to: EndpointId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind: StanzaKind::Set,
            action,
            sid,
            from,
            to,
            content: None,
            reason: None,
            ringing: false,
            headers: Headers::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_kind(mut self, kind: StanzaKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn with_ringing(mut self) -> Self {
        self.ringing = true;
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn is_request(&self) -> bool {
        self.kind.is_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identity() {
        assert_eq!(EndpointId::from("alice@example.com/phone").bare(), "alice@example.com");
        assert_eq!(EndpointId::from("alice@example.com").bare(), "alice@example.com");
        assert_eq!(EndpointId::from("alice@example.com/a/b").bare(), "alice@example.com");
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::from_name("session-initiate"), Action::Initiate);
        assert_eq!(Action::from_name("session-info"), Action::Info);
        assert_eq!(
            Action::from_name("transport-info"),
            Action::Other("transport-info".to_string())
        );
        assert_eq!(Action::Terminate.to_string(), "session-terminate");
    }

    #[test]
    fn test_request_builder() {
        let event = SignalingEvent::request(
            Action::Info,
            SessionId::from("s1"),
            EndpointId::from("bob@example.com/x"),
            EndpointId::from("me@example.com/y"),
        )
        .with_ringing();

        assert!(event.is_request());
        assert!(event.ringing);
        assert!(event.content.is_none());
        assert!(!event.id.is_empty());

        let response = event.clone().with_kind(StanzaKind::Result);
        assert!(!response.is_request());
        assert!(!StanzaKind::Error.is_request());
        assert!(StanzaKind::Get.is_request());
    }
}
