//! Session registry: at most one live game per channel.

use crate::channel::{ChannelSink, InputSource};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::player::PlayerId;
use crate::score::ScoreStore;
use crate::session::GameSession;
use crate::words::Lexicon;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Key identifying one communication channel (one game at a time).
pub type ChannelKey = String;

/// Manages all live game sessions.
///
/// Clones share the same underlying map, so one registry can be handed to
/// every command handler. The "one session per channel" invariant is a
/// guarded insert here, nowhere else.
#[derive(Clone)]
pub struct SessionRegistry {
    config: GameConfig,
    lexicon: Lexicon,
    sessions: Arc<Mutex<HashMap<ChannelKey, Arc<GameSession>>>>,
}

impl SessionRegistry {
    /// Creates a registry that builds sessions with the given config and
    /// lexicon.
    #[instrument(skip(config, lexicon))]
    pub fn new(config: GameConfig, lexicon: Lexicon) -> Self {
        info!("Creating session registry");
        Self {
            config,
            lexicon,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a new session for a channel, in the lobby phase.
    ///
    /// Fails with [`GameError::SessionAlreadyExists`] when the channel
    /// already has a live session. The caller owns the join window and must
    /// eventually drive `start()`; wiring the session's end hook to
    /// [`end_session`](Self::end_session) is also the caller's job, so the
    /// registry never keeps a reference to a finished game.
    #[instrument(skip_all, fields(channel = %key, host = %host))]
    pub fn create_session(
        &self,
        key: impl Into<ChannelKey> + std::fmt::Display,
        host: impl Into<PlayerId> + std::fmt::Display,
        channel: Arc<dyn ChannelSink>,
        input: Arc<dyn InputSource>,
        scores: Arc<dyn ScoreStore>,
    ) -> Result<Arc<GameSession>, GameError> {
        let key = key.into();
        let mut sessions = self.sessions.lock().unwrap();

        if sessions.contains_key(&key) {
            warn!("Session already exists for channel");
            return Err(GameError::SessionAlreadyExists);
        }

        let session = Arc::new(GameSession::new(
            key.clone(),
            host.into(),
            self.config.clone(),
            self.lexicon.clone(),
            channel,
            input,
            scores,
        ));
        sessions.insert(key, session.clone());
        info!(total = sessions.len(), "Session created");
        Ok(session)
    }

    /// Looks up the live session for a channel.
    #[instrument(skip(self))]
    pub fn get_session(&self, key: &str) -> Option<Arc<GameSession>> {
        let sessions = self.sessions.lock().unwrap();
        let session = sessions.get(key).cloned();
        if session.is_none() {
            debug!(channel = key, "No session for channel");
        }
        session
    }

    /// Removes the session mapping for a channel. Idempotent.
    #[instrument(skip(self))]
    pub fn end_session(&self, key: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.remove(key).is_some() {
            info!(channel = key, total = sessions.len(), "Session removed");
        } else {
            debug!(channel = key, "end_session on unknown channel (no-op)");
        }
    }

    /// Lists the channel keys with live sessions.
    #[instrument(skip(self))]
    pub fn list_sessions(&self) -> Vec<ChannelKey> {
        self.sessions.lock().unwrap().keys().cloned().collect()
    }
}
