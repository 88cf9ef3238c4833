//! Outbound call operations
//!
//! [`SessionInitiator`] places calls (`dial`), answers inbound ones
//! (`answer`) and hangs up (`hangup`). Each operation takes the SID's
//! registry lock for its whole read-modify-write, so it serializes with the
//! dispatcher's transitions on the same call.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CallError, Result};
use crate::events::CallFactory;
use crate::gateway::{OutboundMessage, SignalingGateway};
use crate::registry::SessionRegistry;
use crate::session::SharedCall;
use crate::types::{
    Action, CallState, Content, EndpointId, Headers, Reason, Senders, SessionId, SignalingEvent,
};

use super::sid::SidGenerator;

/// Builds and sends session-initiate, session-accept and session-terminate
pub struct SessionInitiator {
    registry: Arc<SessionRegistry>,
    gateway: Arc<dyn SignalingGateway>,
    factory: Arc<dyn CallFactory>,
    sids: SidGenerator,
}

impl SessionInitiator {
    pub fn new(
        registry: Arc<SessionRegistry>,
        gateway: Arc<dyn SignalingGateway>,
        factory: Arc<dyn CallFactory>,
        sids: SidGenerator,
    ) -> Self {
        Self {
            registry,
            gateway,
            factory,
            sids,
        }
    }

    /// Place an outbound call to `remote`
    ///
    /// The new session is registered as PendingOut before the initiate is
    /// sent, and stays locked until the send completes, so a fast accept
    /// from the remote party is applied after registration. Returns as soon
    /// as the initiate is handed to the gateway; if the gateway fails, the
    /// registration is rolled back and the transport error is returned.
    pub async fn dial(&self, remote: EndpointId, headers: Headers) -> Result<SharedCall> {
        let call = self.factory.new_call();
        let description = call.local_description()?;
        let transport = call.transport_info()?;

        let local = self.gateway.local_identity();
        let sid = self.sids.next_sid();
        call.set_sid(sid.clone())?;
        call.set_remote_identity(remote.clone())?;

        let guard = self
            .registry
            .register(sid.clone(), call.clone(), CallState::PendingOut)?;
        debug!("Dialing {} as session {}", remote, sid);

        let content = Content {
            creator: local.to_string(),
            name: local.bare().to_string(),
            senders: Senders::Both,
            description,
            transport,
        };
        let initiate = SignalingEvent::request(Action::Initiate, sid.clone(), local, remote.clone())
            .with_content(content)
            .with_headers(headers);

        if let Err(e) = self.gateway.send(OutboundMessage::Event(initiate)).await {
            warn!("Failed to send session-initiate for {}: {}", sid, e);
            guard.rollback();
            return Err(e);
        }
        drop(guard);

        info!("Outbound call {} to {}", sid, remote);
        Ok(call)
    }

    /// Accept a pending inbound call
    pub async fn answer(&self, sid: &SessionId) -> Result<()> {
        let mut guard = self
            .registry
            .lock(sid)
            .await
            .ok_or_else(|| CallError::session_not_found(sid))?;
        if guard.state() != CallState::PendingIn {
            return Err(CallError::InvalidState {
                sid: sid.clone(),
                state: guard.state(),
                operation: "answer",
            });
        }

        let call = guard.call().clone();
        let remote = remote_of(&call, sid)?;
        let local = self.gateway.local_identity();
        let content = Content {
            creator: remote.to_string(),
            name: local.bare().to_string(),
            senders: Senders::Both,
            description: call.local_description()?,
            transport: call.transport_info()?,
        };
        let accept = SignalingEvent::request(Action::Accept, sid.clone(), local, remote)
            .with_content(content);

        self.gateway.send(OutboundMessage::Event(accept)).await?;
        guard.set_state(CallState::Active);

        info!("Answered call {}", sid);
        Ok(())
    }

    /// Hang up a live call
    ///
    /// The session is evicted and torn down locally even when the terminate
    /// cannot be delivered; the transport error is still returned.
    pub async fn hangup(&self, sid: &SessionId) -> Result<()> {
        let guard = self
            .registry
            .lock(sid)
            .await
            .ok_or_else(|| CallError::session_not_found(sid))?;

        let call = guard.call().clone();
        let remote = remote_of(&call, sid)?;
        let reason = Reason::success();
        call.teardown(&reason).await;
        guard.terminate();

        let terminate = SignalingEvent::request(
            Action::Terminate,
            sid.clone(),
            self.gateway.local_identity(),
            remote,
        )
        .with_reason(reason);

        info!("Hanging up call {}", sid);
        self.gateway.send(OutboundMessage::Event(terminate)).await
    }
}

fn remote_of(call: &SharedCall, sid: &SessionId) -> Result<EndpointId> {
    call.remote_identity()
        .ok_or_else(|| CallError::internal(format!("session {} has no remote identity", sid)))
}

impl std::fmt::Debug for SessionInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInitiator")
            .field("sids", &self.sids)
            .finish()
    }
}
