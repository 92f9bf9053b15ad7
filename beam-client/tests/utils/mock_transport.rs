use async_trait::async_trait;
use beam_client::{
    PeerTransport, SignalSink, TransportError, TransportFactory, TransportSetup, TransportState,
};
use beam_core::IceServerConfig;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Transport that never touches the network.
///
/// With `auto_connect` it reports `Connected` as soon as both descriptions
/// are in place; otherwise the test drives its state through the factory.
pub struct MockTransport {
    sink: SignalSink,
    auto_connect: bool,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self) -> Result<Value, TransportError> {
        self.check_open()?;
        Ok(json!({
            "type": "offer",
            "sdp": format!("mock-offer-{}", self.sink.generation()),
        }))
    }

    async fn accept_offer(&self, offer: Value) -> Result<Value, TransportError> {
        self.check_open()?;
        if offer["type"] != "offer" {
            return Err(TransportError::Closed);
        }
        self.sink.candidate(json!({
            "candidate": format!("candidate:{} 1 udp 1 127.0.0.1 5000 typ host", self.sink.generation()),
        }));
        if self.auto_connect {
            self.sink.state(TransportState::Connected);
        }
        Ok(json!({
            "type": "answer",
            "sdp": format!("mock-answer-{}", self.sink.generation()),
        }))
    }

    async fn apply_answer(&self, _answer: Value) -> Result<(), TransportError> {
        self.check_open()?;
        if self.auto_connect {
            self.sink.state(TransportState::Connected);
        }
        Ok(())
    }

    async fn add_candidate(&self, _candidate: Value) -> Result<(), TransportError> {
        self.check_open()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MockTransport {
    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

#[derive(Default)]
struct Opened {
    sinks: Vec<SignalSink>,
    closed: Vec<Arc<AtomicBool>>,
    track_counts: Vec<usize>,
    ice_servers: Vec<Vec<IceServerConfig>>,
}

#[derive(Clone)]
pub struct MockFactory {
    auto_connect: bool,
    opened: Arc<Mutex<Opened>>,
}

impl MockFactory {
    /// Transports connect once negotiation completes.
    pub fn connecting() -> Self {
        Self {
            auto_connect: true,
            opened: Arc::default(),
        }
    }

    /// Transports stay silent until the test reports a state.
    pub fn manual() -> Self {
        Self {
            auto_connect: false,
            opened: Arc::default(),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.lock().unwrap().sinks.len()
    }

    pub fn closed(&self) -> usize {
        let opened = self.opened.lock().unwrap();
        opened
            .closed
            .iter()
            .filter(|c| c.load(Ordering::SeqCst))
            .count()
    }

    pub fn tracks_of_latest(&self) -> Option<usize> {
        self.opened.lock().unwrap().track_counts.last().copied()
    }

    pub fn ice_servers_of_latest(&self) -> Option<Vec<IceServerConfig>> {
        self.opened.lock().unwrap().ice_servers.last().cloned()
    }

    /// Reports `state` from the most recently opened transport.
    pub fn report_latest(&self, state: TransportState) {
        let opened = self.opened.lock().unwrap();
        if let Some(sink) = opened.sinks.last() {
            sink.state(state);
        }
    }
}

#[async_trait]
impl TransportFactory for MockFactory {
    async fn open(
        &self,
        setup: TransportSetup,
        sink: SignalSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let closed = Arc::new(AtomicBool::new(false));

        let mut opened = self.opened.lock().unwrap();
        opened.sinks.push(sink.clone());
        opened.closed.push(closed.clone());
        opened.track_counts.push(setup.tracks.len());
        opened.ice_servers.push(setup.ice_servers);

        Ok(Box::new(MockTransport {
            sink,
            auto_connect: self.auto_connect,
            closed,
        }))
    }
}
