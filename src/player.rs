//! Seated players and their per-game state.

use serde::{Deserialize, Serialize};

/// Unique identifier for a player (stable for the lifetime of a game).
pub type PlayerId = String;

/// A player seated in a game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player's unique ID.
    pub id: PlayerId,
    /// Player's display name.
    pub name: String,
    /// Whether this player was assigned the imposter role.
    /// Never changes after role assignment.
    pub is_imposter: bool,
    /// Whether this player has asked or answered during the current round.
    /// Reset at the start of every round. Tracked for reporting only; the
    /// pairing draw does not consult it.
    pub has_acted_this_round: bool,
}

impl Player {
    /// Seats a new crew player. Roles are assigned later, when the lobby closes.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_imposter: false,
            has_acted_this_round: false,
        }
    }
}
