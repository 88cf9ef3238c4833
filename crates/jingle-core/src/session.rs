//! Call session capability
//!
//! A [`CallSession`] is supplied by the host application (through a
//! [`crate::events::CallFactory`]) and owns the negotiation and media state of
//! one call. The call-control layer binds its SID and remote identity, feeds
//! it the remote payloads and reports transitions through its hooks; it never
//! touches the session's internals directly.
//!
//! Sessions are shared: the registry and the application hold the same
//! [`SharedCall`], so every method takes `&self`.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::error::{CallError, Result};
use crate::types::{Content, Description, EndpointId, Reason, SessionId, TransportInfo};

/// A call session shared between the registry and the application
pub type SharedCall = Arc<dyn CallSession>;

/// Set-once identity of a call session
///
/// Implementations of [`CallSession`] embed one of these and return it from
/// [`CallSession::identity`]; the provided identity methods of the trait are
/// built on it.
#[derive(Debug, Default)]
pub struct CallIdentity {
    sid: OnceCell<SessionId>,
    remote: OnceCell<EndpointId>,
}

impl CallIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_sid(&self, sid: SessionId) -> Result<()> {
        self.sid
            .set(sid)
            .map_err(|_| CallError::AlreadyBound { field: "sid" })
    }

    pub fn bind_remote(&self, remote: EndpointId) -> Result<()> {
        self.remote
            .set(remote)
            .map_err(|_| CallError::AlreadyBound { field: "remote identity" })
    }

    pub fn sid(&self) -> Option<&SessionId> {
        self.sid.get()
    }

    pub fn remote(&self) -> Option<&EndpointId> {
        self.remote.get()
    }
}

/// Capability object representing one call
///
/// Payload and lifecycle methods are awaited by the dispatcher in event
/// order for a given SID. The `on_*` hooks run after the registry transition
/// has been committed, so they may call back into [`crate::Phone`].
#[async_trait]
pub trait CallSession: Send + Sync {
    /// Identity storage backing the provided identity methods
    fn identity(&self) -> &CallIdentity;

    /// Locally generated media description, read once before an outbound initiate
    fn local_description(&self) -> Result<Description>;

    /// Locally gathered transport parameters
    fn transport_info(&self) -> Result<TransportInfo>;

    /// The remote party's initial offer (inbound calls only)
    async fn on_incoming(&self, content: &Content);

    /// The remote party's accept payload (outbound calls only, at most once)
    async fn setup(&self, content: &Content);

    /// Signaling for this call has ended
    async fn teardown(&self, reason: &Reason);

    /// Best-effort tone playback; a failure never aborts a signaling transition
    async fn play(&self, tone: &str) -> Result<()>;

    /// The remote party answered an outbound call
    async fn on_answer(&self) {}

    /// The remote party hung up
    async fn on_hangup(&self) {}

    /// The remote party is ringing
    async fn on_ring(&self) {}

    fn set_sid(&self, sid: SessionId) -> Result<()> {
        self.identity().bind_sid(sid)
    }

    fn sid(&self) -> Option<SessionId> {
        self.identity().sid().cloned()
    }

    fn set_remote_identity(&self, remote: EndpointId) -> Result<()> {
        self.identity().bind_remote(remote)
    }

    fn remote_identity(&self) -> Option<EndpointId> {
        self.identity().remote().cloned()
    }
}

impl fmt::Debug for dyn CallSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSession")
            .field("sid", &self.identity().sid())
            .field("remote", &self.identity().remote())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, Description, Reason, TransportInfo};

    #[derive(Default)]
    struct SilentCall {
        identity: CallIdentity,
    }

    #[async_trait]
    impl CallSession for SilentCall {
        fn identity(&self) -> &CallIdentity {
            &self.identity
        }
        fn local_description(&self) -> Result<Description> {
            Ok(Description::default())
        }
        fn transport_info(&self) -> Result<TransportInfo> {
            Ok(TransportInfo::default())
        }
        async fn on_incoming(&self, _content: &Content) {}
        async fn setup(&self, _content: &Content) {}
        async fn teardown(&self, _reason: &Reason) {}
        async fn play(&self, _tone: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_shared_call_debug_shows_identity() {
        let call: SharedCall = Arc::new(SilentCall::default());
        call.set_sid(SessionId::from("s9")).unwrap();
        call.set_remote_identity(EndpointId::from("bob@example.com/desk")).unwrap();

        let printed = format!("{:?}", call);
        assert!(printed.starts_with("CallSession"));
        assert!(printed.contains("s9"));
        assert!(printed.contains("bob@example.com/desk"));

        let failed: Result<SharedCall> = Err(CallError::DispatcherStopped);
        assert_eq!(failed.unwrap_err(), CallError::DispatcherStopped);
        let ok: Result<SharedCall> = Ok(call);
        assert!(format!("{:?}", ok).contains("s9"));
    }

    #[test]
    fn test_identity_binds_once() {
        let identity = CallIdentity::new();
        assert!(identity.sid().is_none());

        identity.bind_sid(SessionId::from("s1")).unwrap();
        identity.bind_remote(EndpointId::from("bob@example.com/desk")).unwrap();

        assert_eq!(
            identity.bind_sid(SessionId::from("s2")),
            Err(CallError::AlreadyBound { field: "sid" })
        );
        assert!(identity.bind_remote(EndpointId::from("eve@example.com")).is_err());

        assert_eq!(identity.sid(), Some(&SessionId::from("s1")));
        assert_eq!(identity.remote().map(|r| r.bare()), Some("bob@example.com"));
    }
}
