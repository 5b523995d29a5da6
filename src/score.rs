//! Cumulative score storage shared across sessions.

use crate::player::PlayerId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Process-wide score accumulator.
///
/// Implementations must serialize read-modify-write per identity; multiple
/// sessions may award points to the same player concurrently.
pub trait ScoreStore: Send + Sync {
    /// Adds `amount` to the player's cumulative score.
    fn add(&self, id: &PlayerId, amount: i64);

    /// Returns a snapshot of every recorded score.
    fn get_all(&self) -> HashMap<PlayerId, i64>;

    /// Clears every recorded score.
    fn reset_all(&self);
}

/// In-memory score store. Scores live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    scores: Mutex<HashMap<PlayerId, i64>>,
}

impl MemoryScoreStore {
    /// Creates an empty in-memory score store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn add(&self, id: &PlayerId, amount: i64) {
        let mut scores = self.scores.lock().unwrap();
        let total = scores.entry(id.clone()).or_insert(0);
        *total += amount;
        debug!(player = %id, amount, total = *total, "Score updated");
    }

    fn get_all(&self) -> HashMap<PlayerId, i64> {
        self.scores.lock().unwrap().clone()
    }

    fn reset_all(&self) {
        self.scores.lock().unwrap().clear();
        info!("All scores reset");
    }
}

/// Score store persisted as a JSON file.
///
/// The file is read once at construction and rewritten after every mutation.
/// Write failures are logged and swallowed; an award must never take down a
/// running game.
#[derive(Debug)]
pub struct JsonScoreStore {
    path: PathBuf,
    scores: Mutex<HashMap<PlayerId, i64>>,
}

impl JsonScoreStore {
    /// Opens (or initializes) a score file at `path`.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let scores = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(scores) => scores,
                Err(e) => {
                    warn!(error = %e, "Score file is corrupt; starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        info!(entries = scores.len(), "Score store opened");
        Self {
            path,
            scores: Mutex::new(scores),
        }
    }

    fn persist(&self, scores: &HashMap<PlayerId, i64>) {
        match serde_json::to_string_pretty(scores) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    error!(error = %e, path = %self.path.display(), "Failed to write score file");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialize scores"),
        }
    }
}

impl ScoreStore for JsonScoreStore {
    fn add(&self, id: &PlayerId, amount: i64) {
        let mut scores = self.scores.lock().unwrap();
        *scores.entry(id.clone()).or_insert(0) += amount;
        self.persist(&scores);
    }

    fn get_all(&self) -> HashMap<PlayerId, i64> {
        self.scores.lock().unwrap().clone()
    }

    fn reset_all(&self) {
        let mut scores = self.scores.lock().unwrap();
        scores.clear();
        self.persist(&scores);
        info!("All scores reset");
    }
}
