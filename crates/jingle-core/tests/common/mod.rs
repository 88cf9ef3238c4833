//! Shared fixtures for the jingle-core integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use jingle_core::*;

pub const LOCAL: &str = "me@example.com/desk";
pub const BOB: &str = "bob@example.com/mobile";

/// Call session that records every call made on it
#[derive(Default)]
pub struct MockCall {
    identity: CallIdentity,
    log: Mutex<Vec<String>>,
    fail_play: bool,
}

impl MockCall {
    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn record(&self, entry: String) {
        self.log.lock().push(entry);
    }
}

#[async_trait]
impl CallSession for MockCall {
    fn identity(&self) -> &CallIdentity {
        &self.identity
    }

    fn local_description(&self) -> Result<Description> {
        Ok(Description {
            media: "audio".to_string(),
            payload_types: vec![PayloadType {
                id: 8,
                name: "PCMA".to_string(),
                clockrate: 8000,
            }],
        })
    }

    fn transport_info(&self) -> Result<TransportInfo> {
        Ok(TransportInfo {
            candidates: vec![Candidate {
                component: 1,
                generation: 0,
                ip: "192.0.2.10".to_string(),
                port: 40000,
            }],
        })
    }

    async fn on_incoming(&self, content: &Content) {
        self.record(format!("incoming:{}", content.name));
    }

    async fn setup(&self, content: &Content) {
        self.record(format!("setup:{}", content.name));
    }

    async fn teardown(&self, reason: &Reason) {
        self.record(format!("teardown:{:?}", reason.condition));
    }

    async fn play(&self, tone: &str) -> Result<()> {
        self.record(format!("play:{}", tone));
        if self.fail_play {
            return Err(CallError::media("tone file missing"));
        }
        Ok(())
    }

    async fn on_answer(&self) {
        self.record("on_answer".to_string());
    }

    async fn on_hangup(&self) {
        self.record("on_hangup".to_string());
    }

    async fn on_ring(&self) {
        self.record("on_ring".to_string());
    }
}

/// Application handler forwarding incoming calls to a channel
pub struct MockHandler {
    incoming: mpsc::UnboundedSender<SharedCall>,
    pub errors: Mutex<Vec<CallError>>,
}

impl MockHandler {
    pub fn new(incoming: mpsc::UnboundedSender<SharedCall>) -> Self {
        Self {
            incoming,
            errors: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PhoneHandler for MockHandler {
    async fn on_incoming_call(&self, call: SharedCall) {
        let _ = self.incoming.send(call);
    }

    async fn on_error(&self, error: &CallError) {
        self.errors.lock().push(error.clone());
    }
}

/// Factory keeping a handle on every call it created
#[derive(Default)]
pub struct MockFactory {
    pub created: Mutex<Vec<Arc<MockCall>>>,
    pub fail_play: bool,
}

impl CallFactory for MockFactory {
    fn new_call(&self) -> SharedCall {
        let call = Arc::new(MockCall {
            fail_play: self.fail_play,
            ..Default::default()
        });
        self.created.lock().push(call.clone());
        call
    }
}

impl MockFactory {
    pub fn find(&self, sid: &SessionId) -> Option<Arc<MockCall>> {
        self.created
            .lock()
            .iter()
            .find(|call| call.sid().as_ref() == Some(sid))
            .cloned()
    }
}

/// A started phone wired to an in-memory gateway
pub struct TestPhone {
    pub phone: Arc<Phone>,
    pub gateway: Arc<ChannelGateway>,
    pub handler: Arc<MockHandler>,
    pub factory: Arc<MockFactory>,
    pub outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    pub incoming: mpsc::UnboundedReceiver<SharedCall>,
}

impl TestPhone {
    pub fn start() -> Self {
        Self::start_with(
            PhoneConfig::new()
                .with_ring_tone("ring.wav")
                .with_ringback_tone("ringback.wav"),
            false,
        )
    }

    pub fn start_with(config: PhoneConfig, fail_play: bool) -> Self {
        let (gateway, outbound) = ChannelGateway::new(EndpointId::from(LOCAL), config.event_buffer);
        let gateway = Arc::new(gateway);
        let (incoming_tx, incoming) = mpsc::unbounded_channel();
        let handler = Arc::new(MockHandler::new(incoming_tx));
        let factory = Arc::new(MockFactory {
            fail_play,
            ..Default::default()
        });

        let phone = Phone::new(config, gateway.clone(), handler.clone(), factory.clone())
            .expect("valid phone config");
        phone.start().expect("dispatcher starts");

        Self {
            phone: Arc::new(phone),
            gateway,
            handler,
            factory,
            outbound,
            incoming,
        }
    }

    pub async fn deliver(&self, event: SignalingEvent) {
        assert!(self.gateway.deliver(event).await.expect("dispatcher running"));
    }

    /// Next outbound message, failing the test after a second
    pub async fn next_outbound(&mut self) -> OutboundMessage {
        tokio::time::timeout(Duration::from_secs(1), self.outbound.recv())
            .await
            .expect("timed out waiting for outbound message")
            .expect("outbound channel closed")
    }

    /// Next outbound request, skipping acknowledgements
    pub async fn next_request(&mut self) -> SignalingEvent {
        loop {
            if let OutboundMessage::Event(event) = self.next_outbound().await {
                return event;
            }
        }
    }

    pub async fn next_incoming(&mut self) -> SharedCall {
        tokio::time::timeout(Duration::from_secs(1), self.incoming.recv())
            .await
            .expect("timed out waiting for incoming call")
            .expect("handler dropped")
    }

    /// Poll until the session under `sid` reaches `state` (`None` = evicted)
    pub async fn wait_for_state(&self, sid: &SessionId, state: Option<CallState>) {
        let registry = self.phone.registry().clone();
        let reached = tokio::time::timeout(Duration::from_secs(1), async {
            while registry.state(sid).await != state {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "session {} never reached {:?}", sid, state);
    }

    /// Wait until every event delivered so far has been fully processed
    ///
    /// Sends a marker request through the dispatcher and returns whatever was
    /// sent before the marker's acknowledgement.
    pub async fn flush(&mut self) -> Vec<OutboundMessage> {
        let marker = request(Action::from_name("flush"), &SessionId::from("flush"))
            .with_id("flush-marker");
        self.deliver(marker).await;

        let mut sent = Vec::new();
        loop {
            match self.next_outbound().await {
                OutboundMessage::Ack { id, .. } if id == "flush-marker" => return sent,
                message => sent.push(message),
            }
        }
    }

    /// Messages sent so far, without waiting
    pub fn drain_outbound(&mut self) -> Vec<OutboundMessage> {
        let mut sent = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            sent.push(message);
        }
        sent
    }
}

pub fn content(name: &str) -> Content {
    Content {
        creator: BOB.to_string(),
        name: name.to_string(),
        senders: Senders::Both,
        description: Description::default(),
        transport: TransportInfo::default(),
    }
}

pub fn request(action: Action, sid: &SessionId) -> SignalingEvent {
    SignalingEvent::request(action, sid.clone(), EndpointId::from(BOB), EndpointId::from(LOCAL))
}

pub fn initiate(sid: &SessionId) -> SignalingEvent {
    request(Action::Initiate, sid).with_content(content("offer"))
}

pub fn accept(sid: &SessionId) -> SignalingEvent {
    request(Action::Accept, sid).with_content(content("answer"))
}

pub fn terminate(sid: &SessionId, condition: ReasonCondition) -> SignalingEvent {
    request(Action::Terminate, sid).with_reason(Reason::new(condition))
}

pub fn ringing(sid: &SessionId) -> SignalingEvent {
    request(Action::Info, sid).with_ringing()
}
