//! Room Resolver Tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pretty_assertions::assert_eq;

use direct_chat::application::services::{RoomError, RoomService, RoomServiceImpl};
use direct_chat::domain::{InvalidParticipants, Room, RoomKey, RoomRepository};
use direct_chat::shared::error::AppError;
use direct_chat::shared::snowflake::SnowflakeGenerator;

use crate::common::InMemoryRooms;

fn ids() -> Arc<SnowflakeGenerator> {
    Arc::new(SnowflakeGenerator::new(3, 1_704_067_200_000))
}

fn resolver(rooms: Arc<InMemoryRooms>) -> RoomServiceImpl<InMemoryRooms> {
    RoomServiceImpl::new(rooms, ids())
}

#[tokio::test]
async fn test_resolve_is_symmetric() {
    let rooms = Arc::new(InMemoryRooms::default());
    let service = resolver(rooms.clone());

    let first = service.resolve("bob", "alice").await.unwrap();
    let second = service.resolve("alice", "bob").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.key.as_str(), "alice_bob");
    assert_eq!(first.participant_a, "alice");
    assert_eq!(first.participant_b, "bob");
    assert_eq!(rooms.count(), 1);
    assert_eq!(rooms.insert_attempts(), 1);
}

#[tokio::test]
async fn test_resolve_is_case_sensitive() {
    let rooms = Arc::new(InMemoryRooms::default());
    let service = resolver(rooms.clone());

    let upper = service.resolve("Alice", "bob").await.unwrap();
    let lower = service.resolve("alice", "bob").await.unwrap();

    assert_eq!(upper.key.as_str(), "Alice_bob");
    assert_ne!(upper.id, lower.id);
    assert_eq!(rooms.count(), 2);
}

#[tokio::test]
async fn test_invalid_pairs_never_touch_the_store() {
    let rooms = Arc::new(InMemoryRooms::default());
    let service = resolver(rooms.clone());

    for (a, b, expected) in [
        ("alice", "alice", InvalidParticipants::SameParticipant),
        ("", "bob", InvalidParticipants::Missing),
        ("a_b", "c", InvalidParticipants::ContainsSeparator),
    ] {
        match service.resolve(a, b).await {
            Err(RoomError::InvalidParticipants(e)) => assert_eq!(e, expected),
            other => panic!("expected invalid participants, got {:?}", other),
        }
    }

    assert_eq!(rooms.insert_attempts(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolves_create_one_room() {
    let rooms = Arc::new(InMemoryRooms::default());
    let service = Arc::new(resolver(rooms.clone()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    service.resolve("alice", "bob").await
                } else {
                    service.resolve("bob", "alice").await
                }
            })
        })
        .collect();

    let mut room_ids = Vec::new();
    for handle in handles {
        room_ids.push(handle.await.unwrap().unwrap().id);
    }

    assert_eq!(rooms.count(), 1);
    assert!(room_ids.iter().all(|id| *id == room_ids[0]));
}

/// Hides the existing row from the first lookup, as if another request
/// inserted it between our read and our write.
struct RacingRooms {
    inner: InMemoryRooms,
    hidden_once: AtomicBool,
}

#[async_trait]
impl RoomRepository for RacingRooms {
    async fn find_by_key(&self, key: &RoomKey) -> Result<Option<Room>, AppError> {
        if !self.hidden_once.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_key(key).await
    }

    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        self.inner.create(room).await
    }
}

#[tokio::test]
async fn test_insert_conflict_falls_back_to_existing_row() {
    let inner = InMemoryRooms::default();
    let (key, [a, b]) = RoomKey::derive("alice", "bob").unwrap();
    let winner = inner
        .create(&Room {
            id: 99,
            key: key.clone(),
            participant_a: a.to_string(),
            participant_b: b.to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let repo = Arc::new(RacingRooms {
        inner,
        hidden_once: AtomicBool::new(false),
    });
    let service = RoomServiceImpl::new(repo.clone(), ids());

    let room = service.resolve("bob", "alice").await.unwrap();

    assert_eq!(room, winner);
    assert_eq!(repo.inner.count(), 1);
}

/// Reports a conflict but never returns the row.
struct PhantomConflict;

#[async_trait]
impl RoomRepository for PhantomConflict {
    async fn find_by_key(&self, _key: &RoomKey) -> Result<Option<Room>, AppError> {
        Ok(None)
    }

    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        Err(AppError::Conflict(format!("Room {} already exists", room.key)))
    }
}

#[tokio::test]
async fn test_conflict_without_row_is_internal_error() {
    let service = RoomServiceImpl::new(Arc::new(PhantomConflict), ids());

    let result = service.resolve("alice", "bob").await;

    assert!(matches!(
        result,
        Err(RoomError::Store(AppError::Internal(_)))
    ));
}
