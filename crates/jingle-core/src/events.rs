//! Application callback surface
//!
//! The host application implements [`PhoneHandler`] to learn about incoming
//! calls and transport-level failures, and [`CallFactory`] to supply a fresh
//! [`CallSession`](crate::session::CallSession) for every new call, inbound
//! or outbound.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jingle_core::{CallError, CallSession, PhoneHandler, SharedCall};
//! use async_trait::async_trait;
//!
//! struct Ui;
//!
//! #[async_trait]
//! impl PhoneHandler for Ui {
//!     async fn on_incoming_call(&self, call: SharedCall) {
//!         println!("Incoming call from {:?}", call.remote_identity());
//!     }
//!
//!     async fn on_error(&self, error: &CallError) {
//!         eprintln!("phone error: {}", error);
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::CallError;
use crate::session::SharedCall;

/// Hooks the call-control layer invokes on the host application
#[async_trait]
pub trait PhoneHandler: Send + Sync {
    /// A remote party initiated a call; the session is registered and ringing
    async fn on_incoming_call(&self, call: SharedCall);

    /// A condition the application must react to, e.g. a transport failure.
    /// Protocol no-ops are never reported here.
    async fn on_error(&self, error: &CallError) {
        tracing::warn!("Unhandled phone error: {}", error);
    }
}

/// Creates the call session object for every new call
pub trait CallFactory: Send + Sync {
    fn new_call(&self) -> SharedCall;
}

impl<F> CallFactory for F
where
    F: Fn() -> SharedCall + Send + Sync,
{
    fn new_call(&self) -> SharedCall {
        self()
    }
}
