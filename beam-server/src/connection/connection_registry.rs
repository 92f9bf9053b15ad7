use beam_core::{ConnectionId, Role, ServerMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::warn;

/// A live signaling connection as seen by the relay.
#[derive(Debug)]
pub struct Connection {
    pub role: Option<Role>,
    outbox: mpsc::UnboundedSender<ServerMessage>,
}

/// Open connections keyed by the id handed out on connect.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly opened connection and returns its id.
    pub fn on_connect(&mut self, outbox: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections
            .insert(id, Connection { role: None, outbox });
        id
    }

    /// Forgets a connection. Unknown ids are a no-op.
    pub fn on_disconnect(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    pub fn is_connected(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn role(&self, id: &ConnectionId) -> Option<Role> {
        self.connections.get(id).and_then(|c| c.role)
    }

    /// Latches the role on the first room action. Returns `false` if the
    /// connection is unknown or already plays the other role.
    pub fn assign_role(&mut self, id: &ConnectionId, role: Role) -> bool {
        let Some(connection) = self.connections.get_mut(id) else {
            return false;
        };
        match connection.role {
            None => {
                connection.role = Some(role);
                true
            }
            Some(current) => current == role,
        }
    }

    /// Queues `msg` for `id`. Returns whether the connection was there to take it.
    pub fn deliver(&self, id: &ConnectionId, msg: ServerMessage) -> bool {
        let Some(connection) = self.connections.get(id) else {
            return false;
        };
        if connection.outbox.send(msg).is_err() {
            warn!("Outbox of {} already closed", id);
            return false;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
