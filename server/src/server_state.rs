use std::collections::HashMap;
use std::num::Wrapping;
use system::{ConnectionId, Room, RoomId};

pub struct ServerState {
    pub connection_id_source: Wrapping<ConnectionId>,
    pub connection_locations: HashMap<ConnectionId, RoomId>,
    pub rooms: HashMap<RoomId, Room>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            connection_locations: HashMap::new(),
            rooms: HashMap::new(),
        }
    }

    /// Creates the room on first join.
    pub fn join_room(&mut self, room_id: &RoomId) -> ConnectionId {
        let connection_id = self.new_connection_id();
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(Room::new)
            .join(connection_id);
        self.connection_locations
            .insert(connection_id, room_id.clone());
        log::info!("Connection {} joined room {}", connection_id, room_id);
        connection_id
    }

    /// Removes the connection from its room, dropping the room when it
    /// empties. Returns `None` when the connection was already removed.
    pub fn leave_room(&mut self, connection_id: &ConnectionId) -> Option<RoomId> {
        if let Some(room_id) = self.connection_locations.remove(connection_id) {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.leave(connection_id);
                if room.is_empty() {
                    self.rooms.remove(&room_id);
                    log::info!("Room {} is empty, dropping it", room_id);
                }
            }
            Some(room_id)
        } else {
            None
        }
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&RoomId> {
        self.connection_locations.get(connection_id)
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        self.connection_id_source += Wrapping(1);
        self.connection_id_source.0
    }
}
