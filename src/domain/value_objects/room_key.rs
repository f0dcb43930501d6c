//! Canonical key for a two-party conversation.
//!
//! The key is a pure function of the unordered participant pair: the two
//! identifiers are sorted byte-wise and joined with [`ROOM_KEY_SEPARATOR`].
//! Identifiers are taken as given; no case folding or trimming is applied.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator placed between the two sorted participants.
pub const ROOM_KEY_SEPARATOR: char = '_';

/// Why a participant pair cannot form a room.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParticipants {
    #[error("Both participants are required")]
    Missing,

    #[error("Cannot open a room with yourself")]
    SameParticipant,

    #[error("Participant names may not contain '_'")]
    ContainsSeparator,
}

/// Deterministic room identity for an unordered pair of participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Derive the key for `{a, b}`, returning the participants in canonical
    /// order alongside it.
    pub fn derive<'a>(
        a: &'a str,
        b: &'a str,
    ) -> Result<(Self, [&'a str; 2]), InvalidParticipants> {
        if a.is_empty() || b.is_empty() {
            return Err(InvalidParticipants::Missing);
        }
        if a == b {
            return Err(InvalidParticipants::SameParticipant);
        }
        if a.contains(ROOM_KEY_SEPARATOR) || b.contains(ROOM_KEY_SEPARATOR) {
            return Err(InvalidParticipants::ContainsSeparator);
        }

        let pair = if a < b { [a, b] } else { [b, a] };
        let key = format!("{}{}{}", pair[0], ROOM_KEY_SEPARATOR, pair[1]);
        Ok((Self(key), pair))
    }

    /// Wrap a key read back from the store.
    pub fn from_stored(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
