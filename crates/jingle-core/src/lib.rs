//! # jingle-core
//!
//! Call-control layer for Jingle-style signaling clients.
//!
//! This crate sits between a signaling connection (which parses and
//! serializes stanzas) and the host application (which owns the UI and the
//! media stack). It keeps the registry of live call sessions, places
//! outbound calls and drives every call through its lifecycle as
//! session-initiate, session-accept, session-terminate and session-info
//! requests arrive.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Host Application                 │
//! │   PhoneHandler · CallFactory · CallSession  │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │                  Phone                      │
//! │  SignalingDispatcher · SessionInitiator     │
//! │              SessionRegistry                │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │            SignalingGateway                 │
//! │      (parsed events in, messages out)       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use jingle_core::*;
//! use std::sync::Arc;
//!
//! # async fn example(handler: Arc<dyn PhoneHandler>, factory: Arc<dyn CallFactory>) -> Result<()> {
//! let (gateway, _outbound) = ChannelGateway::new(EndpointId::from("me@example.com/desk"), 64);
//! let phone = Phone::new(PhoneConfig::new().with_ring_tone("ring.wav"), Arc::new(gateway), handler, factory)?;
//! phone.start()?;
//!
//! let call = phone.dial(EndpointId::from("alice@example.com"), Headers::new()).await?;
//! println!("dialing as {:?}", call.sid());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod phone;
pub mod registry;
pub mod session;
pub mod types;

pub use error::{CallError, Result};
pub use events::{CallFactory, PhoneHandler};
pub use gateway::{is_dispatchable, ChannelGateway, OutboundMessage, SignalingGateway};
pub use logging::{setup_logging, LoggingConfig};
pub use phone::{
    IgnoreReason, Phone, PhoneConfig, SessionInitiator, SidGenerator, SignalingDispatcher,
    Transition,
};
pub use registry::{RegistryStats, SessionGuard, SessionRegistry};
pub use session::{CallIdentity, CallSession, SharedCall};
pub use types::*;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
