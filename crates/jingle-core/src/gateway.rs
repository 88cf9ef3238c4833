//! Signaling gateway boundary
//!
//! The gateway is the collaborator that owns the signaling connection: it
//! parses inbound stanzas into [`SignalingEvent`]s, serializes outbound
//! messages and reports the local identity. The call-control layer only sees
//! this trait.
//!
//! Inbound events flow through a channel the gateway hands out once via
//! [`SignalingGateway::take_inbound`]. Only request stanzas are forwarded;
//! results and errors are answers to our own requests and are filtered out
//! here, before they reach the dispatcher.
//!
//! [`ChannelGateway`] is an in-memory implementation backed by tokio
//! channels. Hosts bridge it to their real connection, and tests drive a
//! [`crate::Phone`] through it without a live transport.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{CallError, Result};
use crate::types::{EndpointId, SignalingEvent};

/// A message the call-control layer asks the gateway to send
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Result response acknowledging an inbound request
    Ack {
        /// Stanza id of the acknowledged request
        id: String,
        to: EndpointId,
        from: EndpointId,
    },
    /// A signaling request (initiate, accept, terminate)
    Event(SignalingEvent),
}

impl OutboundMessage {
    /// Build the acknowledgement of an inbound request, addressed back to its sender
    pub fn ack_for(request: &SignalingEvent) -> Self {
        OutboundMessage::Ack {
            id: request.id.clone(),
            to: request.from.clone(),
            from: request.to.clone(),
        }
    }
}

/// The signaling connection as seen by the call-control layer
#[async_trait]
pub trait SignalingGateway: Send + Sync {
    /// Send an outbound message; an error means it could not be delivered
    async fn send(&self, message: OutboundMessage) -> Result<()>;

    /// Identity of the local endpoint on this connection
    fn local_identity(&self) -> EndpointId;

    /// Hand out the inbound request stream; `None` once it has been taken
    fn take_inbound(&self) -> Option<mpsc::Receiver<SignalingEvent>>;
}

/// Whether an inbound event belongs on the dispatcher's stream
pub fn is_dispatchable(event: &SignalingEvent) -> bool {
    event.is_request()
}

/// In-memory gateway backed by tokio channels
pub struct ChannelGateway {
    local: EndpointId,
    inbound_tx: Mutex<Option<mpsc::Sender<SignalingEvent>>>,
    inbound_rx: Mutex<Option<mpsc::Receiver<SignalingEvent>>>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelGateway {
    /// Create a gateway and the receiving end of everything it sends
    pub fn new(
        local: EndpointId,
        buffer: usize,
    ) -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer.max(1));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let gateway = Self {
            local,
            inbound_tx: Mutex::new(Some(inbound_tx)),
            inbound_rx: Mutex::new(Some(inbound_rx)),
            outbound_tx,
        };
        (gateway, outbound_rx)
    }

    /// Feed a parsed inbound event to the dispatcher
    ///
    /// Returns `Ok(false)` when the event was filtered out (a result or error
    /// stanza) and `DispatcherStopped` once the inbound stream is closed.
    pub async fn deliver(&self, event: SignalingEvent) -> Result<bool> {
        if !is_dispatchable(&event) {
            trace!("Dropping {:?} stanza {} for {}", event.kind, event.id, event.sid);
            return Ok(false);
        }

        let tx = self
            .inbound_tx
            .lock()
            .clone()
            .ok_or(CallError::DispatcherStopped)?;
        tx.send(event)
            .await
            .map_err(|_| CallError::DispatcherStopped)?;
        Ok(true)
    }

    /// Close the inbound stream; the dispatcher loop ends once it drains
    pub fn close_inbound(&self) {
        if self.inbound_tx.lock().take().is_some() {
            debug!("Inbound signaling stream closed for {}", self.local);
        }
    }
}

#[async_trait]
impl SignalingGateway for ChannelGateway {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.outbound_tx
            .send(message)
            .map_err(|_| CallError::transport("signaling connection is closed"))
    }

    fn local_identity(&self) -> EndpointId {
        self.local.clone()
    }

    fn take_inbound(&self) -> Option<mpsc::Receiver<SignalingEvent>> {
        self.inbound_rx.lock().take()
    }
}

impl std::fmt::Debug for ChannelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelGateway")
            .field("local", &self.local)
            .field("inbound_open", &self.inbound_tx.lock().is_some())
            .finish()
    }
}
