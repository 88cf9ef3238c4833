//! Signaling dispatcher
//!
//! Consumes the inbound event stream in delivery order and applies the call
//! state machine:
//!
//! ```text
//!  INITIATE (new SID) ──► PendingIn ──┐
//!                                     │ answer()
//!  dial() ──► PendingOut ── ACCEPT ──►├──► Active
//!                                     │
//!  TERMINATE (any live state) ────────┴──► Terminated (evicted, SID retired)
//!
//!  INFO + ringing: ringback tone, on_ring, state unchanged
//! ```
//!
//! Every request is acknowledged before its transition is applied, whether or
//! not the transition turns out to be a no-op. Session payload methods run
//! while the SID's registry lock is held; the `on_*` hooks and the
//! application's incoming-call callback run after it is released.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{CallError, Result};
use crate::events::{CallFactory, PhoneHandler};
use crate::gateway::{OutboundMessage, SignalingGateway};
use crate::registry::SessionRegistry;
use crate::session::SharedCall;
use crate::types::{Action, CallState, SessionId, SignalingEvent};

use super::SharedConfig;

/// Outcome of dispatching one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// New inbound call registered as PendingIn
    Incoming(SessionId),
    /// Outbound call moved to Active
    Answered(SessionId),
    /// Call terminated and evicted
    HungUp(SessionId),
    /// Remote party reported ringing
    Ringing(SessionId),
    /// Protocol no-op
    Ignored(IgnoreReason),
}

/// Why an inbound event left the registry unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A result or error response reached the dispatcher
    NotARequest,
    UnsupportedAction(String),
    /// No live session under the event's SID (late or duplicate message)
    UnknownSession,
    /// INITIATE for a SID that is already registered
    DuplicateSession,
    /// INITIATE replaying the SID of a call that already ended
    TerminatedSession,
    MissingContent,
    MissingReason,
    NotRinging,
    /// The action is not valid for the session's current state
    UnexpectedState(CallState),
}

/// The call state machine driven by inbound signaling
pub struct SignalingDispatcher {
    registry: Arc<SessionRegistry>,
    gateway: Arc<dyn SignalingGateway>,
    handler: Arc<dyn PhoneHandler>,
    factory: Arc<dyn CallFactory>,
    config: SharedConfig,
}

impl SignalingDispatcher {
    pub fn new(
        registry: Arc<SessionRegistry>,
        gateway: Arc<dyn SignalingGateway>,
        handler: Arc<dyn PhoneHandler>,
        factory: Arc<dyn CallFactory>,
        config: SharedConfig,
    ) -> Self {
        Self {
            registry,
            gateway,
            handler,
            factory,
            config,
        }
    }

    /// Process inbound events until the gateway closes the stream
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<SignalingEvent>) {
        info!("Starting signaling dispatcher for {}", self.gateway.local_identity());

        while let Some(event) = inbound.recv().await {
            match self.dispatch(event).await {
                Ok(Transition::Ignored(reason)) => debug!("Event ignored: {:?}", reason),
                Ok(transition) => debug!("Applied transition {:?}", transition),
                Err(e) => {
                    error!("Error handling signaling event: {}", e);
                    self.handler.on_error(&e).await;
                }
            }
        }

        info!("Signaling dispatcher stopped");
    }

    /// Acknowledge one inbound event and apply its transition
    pub async fn dispatch(&self, event: SignalingEvent) -> Result<Transition> {
        debug!(
            "Inbound {} for {} from {} (stanza {})",
            event.action, event.sid, event.from, event.id
        );

        if !event.is_request() {
            return Ok(Transition::Ignored(IgnoreReason::NotARequest));
        }
        self.acknowledge(&event).await;

        match event.action.clone() {
            Action::Initiate => self.handle_initiate(event).await,
            Action::Accept => self.handle_accept(event).await,
            Action::Terminate => self.handle_terminate(event).await,
            Action::Info => self.handle_info(event).await,
            Action::Other(name) => Ok(Transition::Ignored(IgnoreReason::UnsupportedAction(name))),
        }
    }

    async fn acknowledge(&self, event: &SignalingEvent) {
        if let Err(e) = self.gateway.send(OutboundMessage::ack_for(event)).await {
            warn!("Failed to acknowledge stanza {} for {}: {}", event.id, event.sid, e);
            self.handler.on_error(&e).await;
        }
    }

    async fn handle_initiate(&self, event: SignalingEvent) -> Result<Transition> {
        let Some(content) = event.content else {
            warn!("session-initiate for {} carries no content", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::MissingContent));
        };
        if self.registry.is_terminated(&event.sid) {
            debug!("session-initiate replays terminated session {}", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::TerminatedSession));
        }
        if self.registry.contains(&event.sid) {
            warn!("Duplicate session-initiate for live session {}", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::DuplicateSession));
        }

        let call = self.factory.new_call();
        call.set_sid(event.sid.clone())?;
        call.set_remote_identity(event.from.clone())?;

        let guard = match self
            .registry
            .register(event.sid.clone(), call.clone(), CallState::PendingIn)
        {
            Ok(guard) => guard,
            Err(CallError::DuplicateSession { .. }) if self.registry.is_terminated(&event.sid) => {
                return Ok(Transition::Ignored(IgnoreReason::TerminatedSession));
            }
            Err(CallError::DuplicateSession { .. }) => {
                return Ok(Transition::Ignored(IgnoreReason::DuplicateSession));
            }
            Err(e) => return Err(e),
        };

        call.on_incoming(&content).await;
        let ring_tone = self.config.read().ring_tone.clone();
        play_tone(&call, ring_tone.as_deref()).await;
        drop(guard);

        info!("Incoming call {} from {}", event.sid, event.from);
        self.handler.on_incoming_call(call).await;
        Ok(Transition::Incoming(event.sid))
    }

    async fn handle_accept(&self, event: SignalingEvent) -> Result<Transition> {
        let Some(content) = event.content else {
            debug!("session-accept for {} carries no content", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::MissingContent));
        };
        let Some(mut guard) = self.registry.lock(&event.sid).await else {
            debug!("session-accept for unknown session {}", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::UnknownSession));
        };
        if guard.state() != CallState::PendingOut {
            warn!("session-accept for {} in state {:?}", event.sid, guard.state());
            return Ok(Transition::Ignored(IgnoreReason::UnexpectedState(guard.state())));
        }

        let call = guard.call().clone();
        call.setup(&content).await;
        guard.set_state(CallState::Active);
        drop(guard);

        info!("Call {} accepted by {}", event.sid, event.from);
        call.on_answer().await;
        Ok(Transition::Answered(event.sid))
    }

    async fn handle_terminate(&self, event: SignalingEvent) -> Result<Transition> {
        let Some(reason) = event.reason else {
            debug!("session-terminate for {} carries no reason", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::MissingReason));
        };
        let Some(guard) = self.registry.lock(&event.sid).await else {
            debug!("session-terminate for unknown session {}", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::UnknownSession));
        };

        guard.call().teardown(&reason).await;
        let call = guard.terminate();

        info!("Call {} hung up by {} ({:?})", event.sid, event.from, reason.condition);
        call.on_hangup().await;
        Ok(Transition::HungUp(event.sid))
    }

    async fn handle_info(&self, event: SignalingEvent) -> Result<Transition> {
        if !event.ringing {
            return Ok(Transition::Ignored(IgnoreReason::NotRinging));
        }
        let Some(guard) = self.registry.lock(&event.sid).await else {
            debug!("session-info for unknown session {}", event.sid);
            return Ok(Transition::Ignored(IgnoreReason::UnknownSession));
        };

        let call = guard.call().clone();
        let ringback_tone = self.config.read().ringback_tone.clone();
        play_tone(&call, ringback_tone.as_deref()).await;
        drop(guard);

        debug!("Remote party ringing for {}", event.sid);
        call.on_ring().await;
        Ok(Transition::Ringing(event.sid))
    }
}

/// Best-effort tone playback
async fn play_tone(call: &SharedCall, tone: Option<&str>) {
    let Some(tone) = tone else {
        return;
    };
    if let Err(e) = call.play(tone).await {
        warn!("Failed to play tone {}: {}", tone, e);
    }
}

impl std::fmt::Debug for SignalingDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingDispatcher")
            .field("registry", &self.registry)
            .field("local", &self.gateway.local_identity())
            .finish()
    }
}
