//! Error taxonomy for the game engine.

use derive_more::{Display, Error};

/// Errors surfaced by registry and session operations.
///
/// `DuplicateJoin` and `CapacityExceeded` are feedback for the joining actor
/// only and never fatal. `InputTimeout` is recovered inside the state machine
/// by eliminating the unresponsive player. `Aborted` signals that an explicit
/// stop tore the session down mid-wait, so no elimination or scoring may
/// follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// The player is already seated in this game.
    #[display("you have already joined this game")]
    DuplicateJoin,
    /// The lobby has reached its player capacity.
    #[display("the lobby is full")]
    CapacityExceeded,
    /// The actor may not perform this command (host/admin only).
    #[display("only the host or an administrator can do that")]
    NotAuthorized,
    /// No game is running for the channel.
    #[display("no game is currently running here")]
    NoActiveSession,
    /// A game is already running for the channel.
    #[display("a game is already running in this channel")]
    SessionAlreadyExists,
    /// A solicited player did not respond within the allotted time.
    #[display("the player did not respond in time")]
    InputTimeout,
    /// The session was stopped externally while waiting for input.
    #[display("the game was stopped")]
    Aborted,
}
