use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignalKind {
    StateChanged(TransportState),
    /// Trickled local candidate, already in its wire form.
    LocalCandidate(Value),
    Error(String),
}

/// A callback from a transport, stamped with the generation it was opened as.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSignal {
    pub generation: u64,
    pub kind: TransportSignalKind,
}

/// Where a transport reports its callbacks.
#[derive(Debug, Clone)]
pub struct SignalSink {
    generation: u64,
    tx: mpsc::UnboundedSender<TransportSignal>,
}

impl SignalSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<TransportSignal>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self, state: TransportState) {
        self.emit(TransportSignalKind::StateChanged(state));
    }

    pub fn candidate(&self, candidate: Value) {
        self.emit(TransportSignalKind::LocalCandidate(candidate));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(TransportSignalKind::Error(message.into()));
    }

    fn emit(&self, kind: TransportSignalKind) {
        // Receiver gone means the session already finished.
        let _ = self.tx.send(TransportSignal {
            generation: self.generation,
            kind,
        });
    }
}
