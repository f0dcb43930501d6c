//! WebSocket Gateway
//!
//! In-process registry of live connections and room broadcast groups.
//! Each connection belongs to at most one room at a time; joining another
//! room leaves the previous one.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerEvent;
use crate::domain::RoomKey;

/// Identifier of a single WebSocket connection
pub type ConnectionId = Uuid;

/// Outbound half of a connection
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// A registered connection
#[derive(Debug)]
struct ConnectedSession {
    username: String,
    sender: EventSender,
    room: Mutex<Option<RoomKey>>,
}

/// Connection and room registry
#[derive(Debug)]
pub struct Gateway {
    /// Connection ID -> session
    sessions: DashMap<ConnectionId, Arc<ConnectedSession>>,
    /// Room key -> connections subscribed to it
    rooms: DashMap<RoomKey, HashSet<ConnectionId>>,
    heartbeat_interval_ms: u64,
}

impl Gateway {
    pub fn new(heartbeat_interval_ms: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            rooms: DashMap::new(),
            heartbeat_interval_ms,
        }
    }

    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Register a connection authenticated as `username`.
    pub fn register(&self, username: &str, sender: EventSender) -> ConnectionId {
        let connection_id = Uuid::new_v4();
        self.sessions.insert(
            connection_id,
            Arc::new(ConnectedSession {
                username: username.to_string(),
                sender,
                room: Mutex::new(None),
            }),
        );

        tracing::debug!(connection_id = %connection_id, username = %username, "Connection registered");
        connection_id
    }

    /// Forget a connection and drop it from its room.
    pub fn unregister(&self, connection_id: ConnectionId) {
        if let Some((_, session)) = self.sessions.remove(&connection_id) {
            if let Some(room) = session.room.lock().take() {
                self.remove_member(&room, connection_id);
            }

            tracing::debug!(
                connection_id = %connection_id,
                username = %session.username,
                "Connection unregistered"
            );
        }
    }

    /// Subscribe a connection to `room`, leaving any other room first.
    /// Returns false for an unknown connection.
    pub fn join(&self, connection_id: ConnectionId, room: &RoomKey) -> bool {
        let Some(session) = self.session(connection_id) else {
            return false;
        };

        let mut current = session.room.lock();
        if current.as_ref() == Some(room) {
            return true;
        }

        if let Some(previous) = current.take() {
            self.remove_member(&previous, connection_id);
            tracing::debug!(connection_id = %connection_id, room_key = %previous, "Left room");
        }

        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id);
        *current = Some(room.clone());

        tracing::debug!(connection_id = %connection_id, room_key = %room, "Joined room");
        true
    }

    /// Room the connection is currently subscribed to
    pub fn current_room(&self, connection_id: ConnectionId) -> Option<RoomKey> {
        let session = self.session(connection_id)?;
        let room = session.room.lock().clone();
        room
    }

    /// Send an event to one connection.
    pub fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        self.session(connection_id)
            .map(|session| session.sender.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Send an event to every connection in `room`; returns how many
    /// connections accepted it.
    pub fn broadcast(&self, room: &RoomKey, event: &ServerEvent) -> usize {
        let members = self.room_members(room);

        members
            .into_iter()
            .filter(|id| self.send_to(*id, event.clone()))
            .count()
    }

    /// Connections subscribed to `room`
    pub fn room_members(&self, room: &RoomKey) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Get connection count
    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, connection_id: ConnectionId) -> Option<Arc<ConnectedSession>> {
        self.sessions
            .get(&connection_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn remove_member(&self, room: &RoomKey, connection_id: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }
}
