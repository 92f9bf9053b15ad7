use crate::room::DirectoryError;
use beam_core::{ConnectionId, RoomCode};
use std::collections::HashMap;

/// Who occupies a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomEntry {
    pub host: ConnectionId,
    pub viewer: Option<ConnectionId>,
}

/// Room code to occupants. Single source of truth for pairing.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomCode, RoomEntry>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a room for `host` under a freshly generated code.
    pub fn create_room(&mut self, host: ConnectionId) -> (RoomCode, Option<RoomEntry>) {
        let code = RoomCode::generate();
        let displaced = self.insert(code.clone(), host);
        (code, displaced)
    }

    /// Stores `code -> host`. On a code collision the newer room replaces the
    /// older one, which is returned.
    pub fn insert(&mut self, code: RoomCode, host: ConnectionId) -> Option<RoomEntry> {
        self.rooms.insert(code, RoomEntry { host, viewer: None })
    }

    pub fn resolve_room(&self, code: &RoomCode) -> Result<ConnectionId, DirectoryError> {
        self.rooms
            .get(code)
            .map(|room| room.host)
            .ok_or_else(|| DirectoryError::RoomNotFound(code.clone()))
    }

    /// Seats `viewer` in the room and returns its host.
    pub fn attach_viewer(
        &mut self,
        code: &RoomCode,
        viewer: ConnectionId,
    ) -> Result<ConnectionId, DirectoryError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| DirectoryError::RoomNotFound(code.clone()))?;

        match room.viewer {
            Some(current) if current != viewer => Err(DirectoryError::RoomFull(code.clone())),
            _ => {
                room.viewer = Some(viewer);
                Ok(room.host)
            }
        }
    }

    /// Removes every room hosted by `host`.
    pub fn delete_rooms_hosted_by(&mut self, host: &ConnectionId) -> Vec<(RoomCode, RoomEntry)> {
        let codes: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.host == *host)
            .map(|(code, _)| code.clone())
            .collect();

        codes
            .into_iter()
            .filter_map(|code| self.rooms.remove(&code).map(|room| (code, room)))
            .collect()
    }

    /// Empties every viewer slot held by `viewer`, returning the rooms' codes and hosts.
    pub fn release_viewer(&mut self, viewer: &ConnectionId) -> Vec<(RoomCode, ConnectionId)> {
        self.release_viewer_where(viewer, |_| true)
    }

    /// Like [`release_viewer`](Self::release_viewer) but leaves the slot in `keep` alone.
    pub fn release_viewer_except(
        &mut self,
        viewer: &ConnectionId,
        keep: &RoomCode,
    ) -> Vec<(RoomCode, ConnectionId)> {
        self.release_viewer_where(viewer, |code| code != keep)
    }

    fn release_viewer_where(
        &mut self,
        viewer: &ConnectionId,
        pick: impl Fn(&RoomCode) -> bool,
    ) -> Vec<(RoomCode, ConnectionId)> {
        self.rooms
            .iter_mut()
            .filter(|(code, room)| room.viewer.as_ref() == Some(viewer) && pick(code))
            .map(|(code, room)| {
                room.viewer = None;
                (code.clone(), room.host)
            })
            .collect()
    }

    /// Whether `a` and `b` are the two occupants of some room.
    pub fn is_paired(&self, a: &ConnectionId, b: &ConnectionId) -> bool {
        self.rooms.values().any(|room| {
            (room.host == *a && room.viewer.as_ref() == Some(b))
                || (room.host == *b && room.viewer.as_ref() == Some(a))
        })
    }

    pub fn get(&self, code: &RoomCode) -> Option<&RoomEntry> {
        self.rooms.get(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
