//! Phone: the call-control facade
//!
//! A [`Phone`] lives for one signaling connection. It owns the session
//! registry and wires it into both the [`SignalingDispatcher`] (inbound
//! events) and the [`SessionInitiator`] (outbound calls).
//!
//! ```text
//! ┌──────────────────────┐        ┌───────────────────────────┐
//! │  Signaling Gateway   │──────► │   SignalingDispatcher     │──┐
//! │  (inbound channel)   │        │   (state machine)         │  │
//! └──────────▲───────────┘        └───────────────────────────┘  │
//!            │ send                                               ▼
//!            │                    ┌───────────────────────────┐  ┌─────────────────┐
//!            └────────────────────│   SessionInitiator        │─►│ SessionRegistry │
//!                                 │   dial / answer / hangup  │  └─────────────────┘
//!                                 └───────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use jingle_core::{ChannelGateway, EndpointId, Headers, Phone, PhoneConfig};
//! # use jingle_core::{CallFactory, PhoneHandler};
//! # use std::sync::Arc;
//! # async fn example(handler: Arc<dyn PhoneHandler>, factory: Arc<dyn CallFactory>) -> jingle_core::Result<()> {
//! let config = PhoneConfig::new().with_ringback_tone("ringback.wav");
//! let (gateway, _outbound) = ChannelGateway::new(EndpointId::from("me@example.com/desk"), config.event_buffer);
//! let gateway = Arc::new(gateway);
//!
//! let phone = Phone::new(config, gateway.clone(), handler, factory)?;
//! phone.start()?;
//!
//! let call = phone.dial(EndpointId::from("alice@example.com"), Headers::new()).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatcher;
mod initiator;
mod sid;


pub use config::{PhoneConfig, DEFAULT_EVENT_BUFFER, DEFAULT_SID_PREFIX};
pub use dispatcher::{IgnoreReason, SignalingDispatcher, Transition};
pub use initiator::SessionInitiator;
pub use sid::SidGenerator;

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{CallError, Result};
use crate::events::{CallFactory, PhoneHandler};
use crate::gateway::SignalingGateway;
use crate::registry::SessionRegistry;
use crate::session::SharedCall;
use crate::types::{EndpointId, Headers, SessionId};

/// Configuration shared between the phone and its dispatcher
pub(crate) type SharedConfig = Arc<RwLock<PhoneConfig>>;

/// Call control for one signaling connection
pub struct Phone {
    config: SharedConfig,
    registry: Arc<SessionRegistry>,
    gateway: Arc<dyn SignalingGateway>,
    dispatcher: Arc<SignalingDispatcher>,
    initiator: SessionInitiator,
}

impl Phone {
    /// Wire a phone to its gateway and application hooks
    pub fn new(
        config: PhoneConfig,
        gateway: Arc<dyn SignalingGateway>,
        handler: Arc<dyn PhoneHandler>,
        factory: Arc<dyn CallFactory>,
    ) -> Result<Self> {
        config.validate()?;

        let sids = SidGenerator::new(config.sid_prefix.clone());
        let config = Arc::new(RwLock::new(config));
        let registry = Arc::new(SessionRegistry::new());

        let dispatcher = Arc::new(SignalingDispatcher::new(
            registry.clone(),
            gateway.clone(),
            handler,
            factory.clone(),
            config.clone(),
        ));
        let initiator = SessionInitiator::new(registry.clone(), gateway.clone(), factory, sids);

        Ok(Self {
            config,
            registry,
            gateway,
            dispatcher,
            initiator,
        })
    }

    /// Spawn the dispatcher loop on the gateway's inbound stream
    ///
    /// The loop ends when the gateway closes the stream. The stream can only
    /// be taken once, so a second call fails with `DispatcherStopped`.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        let inbound = self
            .gateway
            .take_inbound()
            .ok_or(CallError::DispatcherStopped)?;

        info!("Phone started for {}", self.gateway.local_identity());
        Ok(tokio::spawn(self.dispatcher.clone().run(inbound)))
    }

    /// Place an outbound call; see [`SessionInitiator::dial`]
    pub async fn dial(&self, remote: EndpointId, headers: Headers) -> Result<SharedCall> {
        self.initiator.dial(remote, headers).await
    }

    /// Accept a pending inbound call
    pub async fn answer(&self, sid: &SessionId) -> Result<()> {
        self.initiator.answer(sid).await
    }

    /// Hang up a live call
    pub async fn hangup(&self, sid: &SessionId) -> Result<()> {
        self.initiator.hangup(sid).await
    }

    pub fn ring_tone(&self) -> Option<String> {
        self.config.read().ring_tone.clone()
    }

    pub fn set_ring_tone(&self, tone: Option<String>) {
        self.config.write().ring_tone = tone;
    }

    pub fn ringback_tone(&self) -> Option<String> {
        self.config.read().ringback_tone.clone()
    }

    pub fn set_ringback_tone(&self, tone: Option<String>) {
        self.config.write().ringback_tone = tone;
    }

    pub fn config(&self) -> PhoneConfig {
        self.config.read().clone()
    }

    pub fn local_identity(&self) -> EndpointId {
        self.gateway.local_identity()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<SignalingDispatcher> {
        &self.dispatcher
    }
}

impl std::fmt::Debug for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phone")
            .field("local", &self.gateway.local_identity())
            .field("config", &*self.config.read())
            .field("registry", &self.registry)
            .finish()
    }
}
