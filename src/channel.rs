//! Capability traits at the chat-platform boundary.
//!
//! The session core never talks to a chat platform directly. Embedders
//! implement these traits over their transport (a Discord channel, a test
//! harness, an IRC connection) and inject them at session creation.

use crate::player::PlayerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One selectable option in a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable value reported back when the choice is picked.
    pub id: String,
    /// Human-readable label, re-rendered on live tally updates.
    pub label: String,
}

impl Choice {
    /// Creates a choice.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Outbound message delivery for one channel.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    /// Sends a public notice to the channel.
    async fn send(&self, content: &str) -> anyhow::Result<()>;

    /// Sends a public prompt with selectable choices. The returned handle
    /// supports relabeling the choices, used for live vote tallies.
    async fn send_with_choices(
        &self,
        content: &str,
        choices: &[Choice],
    ) -> anyhow::Result<Box<dyn ChoicePrompt>>;

    /// Sends a message visible only to one player (role and word delivery,
    /// per-actor feedback).
    async fn send_private(&self, to: &PlayerId, content: &str) -> anyhow::Result<()>;
}

/// Handle to a previously sent choice prompt.
#[async_trait]
pub trait ChoicePrompt: Send + Sync {
    /// Replaces the prompt's choices (same ids, updated labels).
    async fn update(&self, choices: &[Choice]) -> anyhow::Result<()>;
}

/// Inbound player input, bounded by a timeout.
///
/// `None` always means the timeout elapsed with no qualifying input.
/// Cancellation on session stop is handled by the session itself, which races
/// every wait against its stop signal.
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Waits for the next channel message from `from`.
    async fn await_message(&self, from: &PlayerId, timeout: Duration) -> Option<String>;

    /// Waits for the next choice selection made by any of `eligible`.
    /// Returns the chooser and the selected choice id. Calling repeatedly
    /// against one deadline yields a live collector; a single call yields a
    /// one-shot collector.
    async fn await_choice(
        &self,
        eligible: &[PlayerId],
        timeout: Duration,
    ) -> Option<(PlayerId, String)>;
}
