//! Secret word lexicon: uniform draws and decoy sampling.

use rand::seq::SliceRandom;
use tracing::instrument;

/// Built-in word set used when the embedder does not supply one.
const BUILTIN_WORDS: &[&str] = &[
    "apple",
    "banana",
    "orange",
    "car",
    "airplane",
    "cat",
    "dog",
    "lion",
    "tiger",
    "elephant",
    "school",
    "hospital",
    "university",
    "stadium",
    "library",
    "computer",
    "phone",
    "television",
    "watch",
    "glasses",
    "pen",
    "book",
    "paper",
    "backpack",
    "whiteboard",
    "sun",
    "moon",
    "star",
    "cloud",
    "rain",
    "sea",
    "river",
    "mountain",
    "desert",
    "forest",
    "pizza",
    "burger",
    "shawarma",
    "pancake",
    "doughnut",
    "football",
    "swimming",
    "running",
    "basketball",
    "tennis",
    "egypt",
    "japan",
    "brazil",
    "canada",
    "morocco",
    "doctor",
    "engineer",
    "teacher",
    "chef",
    "police officer",
];

/// A fixed, non-empty word set supporting secret-word draws and
/// without-replacement decoy sampling.
#[derive(Debug, Clone)]
pub struct Lexicon {
    words: Vec<String>,
}

impl Lexicon {
    /// Creates a lexicon from the built-in word set.
    #[instrument]
    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    /// Creates a lexicon from a custom word set.
    ///
    /// Returns `None` for an empty set, so a constructed lexicon can always
    /// produce a secret word.
    #[instrument(skip(words))]
    pub fn from_words(words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        Some(Self { words })
    }

    /// Number of words in the set.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; kept for API completeness.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Draws one word uniformly at random.
    pub fn random_word(&self) -> &str {
        self.words
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Samples up to `count` decoy words uniformly without replacement,
    /// excluding `excluding`.
    ///
    /// If `count` exceeds the remaining pool the full remaining pool is
    /// returned; with the built-in set the pool always exceeds typical
    /// request sizes.
    #[instrument(skip(self))]
    pub fn distractors(&self, excluding: &str, count: usize) -> Vec<String> {
        let mut pool: Vec<String> = self
            .words
            .iter()
            .filter(|w| w.as_str() != excluding)
            .cloned()
            .collect();
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);
        pool
    }
}
