use crate::connection::ConnectionRegistry;
use crate::relay::RelayCommand;
use crate::room::{DirectoryError, RoomDirectory};
use beam_core::{ClientMessage, ConnectionId, IceServerConfig, Role, RoomCode, ServerMessage};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pairs hosts with viewers and ferries negotiation messages between them.
///
/// Every command is handled to completion before the next one, so the
/// registry and the directory need no locking.
pub struct Relay {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    ice_servers: Vec<IceServerConfig>,
}

impl Relay {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::new(),
            ice_servers,
        }
    }

    pub async fn run(mut self, mut command_rx: mpsc::Receiver<RelayCommand>) {
        info!("Relay event loop started");

        while let Some(cmd) = command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!("Command channel closed. Relay event loop finished");
    }

    pub fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect { outbox, reply } => {
                let id = self.connect(outbox);
                if reply.send(id).is_err() {
                    warn!("Connection {} vanished before learning its id", id);
                    self.disconnect(&id);
                }
            }
            RelayCommand::Message { from, message } => self.dispatch(from, message),
            RelayCommand::Disconnect { id } => self.disconnect(&id),
        }
    }

    pub fn connect(&mut self, outbox: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let id = self.registry.on_connect(outbox);
        info!("Connection opened: {}", id);

        self.registry.deliver(
            &id,
            ServerMessage::IceConfig {
                ice_servers: self.ice_servers.clone(),
            },
        );
        id
    }

    pub fn dispatch(&mut self, from: ConnectionId, message: ClientMessage) {
        if !self.registry.is_connected(&from) {
            warn!("Dropping {} from unknown connection {}", message.kind(), from);
            return;
        }

        match message {
            ClientMessage::CreateRoom => self.create_room(from),
            ClientMessage::JoinRoom { room } => self.join_room(from, room),
            negotiation => self.relay(from, negotiation),
        }
    }

    pub fn disconnect(&mut self, id: &ConnectionId) {
        if self.registry.on_disconnect(id).is_none() {
            return;
        }
        info!("Connection closed: {}", id);

        let mut orphaned = HashSet::new();
        for (code, room) in self.directory.delete_rooms_hosted_by(id) {
            info!("Room {} deleted, host {} left", code, id);
            orphaned.extend(room.viewer);
        }
        for viewer in orphaned {
            self.registry
                .deliver(&viewer, ServerMessage::HostDisconnected);
        }

        for (code, host) in self.directory.release_viewer(id) {
            info!("Viewer {} left room {}", id, code);
            self.registry
                .deliver(&host, ServerMessage::ViewerLeft { viewer: *id });
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    fn create_room(&mut self, host: ConnectionId) {
        if !self.registry.assign_role(&host, Role::Host) {
            warn!("Viewer {} tried to create a room", host);
            return;
        }

        let (room, displaced) = self.directory.create_room(host);
        if let Some(old) = displaced {
            warn!("Room code {} collided, replacing room of {}", room, old.host);
        }
        info!("Room {} created by {}", room, host);

        self.registry
            .deliver(&host, ServerMessage::RoomCreated { room });
    }

    fn join_room(&mut self, viewer: ConnectionId, room: RoomCode) {
        if self.registry.role(&viewer) == Some(Role::Host) {
            warn!("Host {} tried to join room {}", viewer, room);
            return;
        }

        // A connection holds at most one viewer slot.
        for (code, host) in self.directory.release_viewer_except(&viewer, &room) {
            info!("Viewer {} moved out of room {}", viewer, code);
            self.registry
                .deliver(&host, ServerMessage::ViewerLeft { viewer });
        }

        match self.directory.attach_viewer(&room, viewer) {
            Ok(host) => {
                self.registry.assign_role(&viewer, Role::Viewer);
                info!("Viewer {} joined room {} hosted by {}", viewer, room, host);

                self.registry
                    .deliver(&host, ServerMessage::ViewerJoined { viewer });
                self.registry
                    .deliver(&viewer, ServerMessage::JoinedRoom { host });
            }
            Err(DirectoryError::RoomNotFound(_)) => {
                info!("Viewer {} asked for unknown room {}", viewer, room);
                self.registry.deliver(&viewer, ServerMessage::RoomNotFound);
            }
            Err(DirectoryError::RoomFull(_)) => {
                info!("Viewer {} turned away from full room {}", viewer, room);
                self.registry.deliver(&viewer, ServerMessage::RoomFull);
            }
        }
    }

    fn relay(&mut self, from: ConnectionId, message: ClientMessage) {
        let kind = message.kind();
        let Some((target, relayed)) = message.into_relayed(from) else {
            return;
        };

        if !self.directory.is_paired(&from, &target) {
            warn!("Dropping {} from {}: {} is not its peer", kind, from, target);
            return;
        }

        if self.registry.deliver(&target, relayed) {
            debug!("Relayed {} {} -> {}", kind, from, target);
        } else {
            debug!("Dropped {} {} -> {}: target gone", kind, from, target);
        }
    }
}
