//! Imposter - a social-deduction party game engine for shared chat channels.
//!
//! One or more imposters are secretly assigned among a crew; a secret word is
//! revealed only to crew members. Three rounds (plus one optional extra) of
//! paired question/answer exchanges let players probe each other, then a vote
//! and an imposter word-guessing mini-phase decide the winning faction.
//!
//! # Architecture
//!
//! - **Registry**: one live [`GameSession`] per channel key
//! - **Session**: the phase state machine (lobby, rounds, vote, guess)
//! - **Capabilities**: [`ChannelSink`], [`InputSource`], and [`ScoreStore`]
//!   traits implemented by the embedder (a chat bot, a test harness)
//! - **Lexicon**: secret word draws and decoy sampling
//!
//! # Example
//!
//! ```no_run
//! use imposter::{GameConfig, Lexicon, SessionRegistry};
//!
//! # fn example(channel: std::sync::Arc<dyn imposter::ChannelSink>,
//! #            input: std::sync::Arc<dyn imposter::InputSource>,
//! #            scores: std::sync::Arc<dyn imposter::ScoreStore>) -> anyhow::Result<()> {
//! let registry = SessionRegistry::new(GameConfig::default(), Lexicon::builtin());
//! let session = registry.create_session("channel-1", "host", channel, input, scores)?;
//! session.join("host", "Ana");
//! // ... more joins, then after the join window:
//! // session.start().await drives the game to completion.
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod channel;
mod config;
mod error;
mod player;
mod registry;
mod score;
mod session;
mod telemetry;
mod words;

pub use channel::{ChannelSink, Choice, ChoicePrompt, InputSource};
pub use config::{ConfigError, GameConfig};
pub use error::GameError;
pub use player::{Player, PlayerId};
pub use registry::{ChannelKey, SessionRegistry};
pub use score::{JsonScoreStore, MemoryScoreStore, ScoreStore};
pub use session::{EndHook, Faction, GameSession, JoinOutcome, Phase};
pub use telemetry::init_tracing;
pub use words::Lexicon;
