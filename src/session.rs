//! The game session state machine.
//!
//! A session moves through five phases: lobby, playing, voting, guessing,
//! ended. One driving task owns progression; all shared state sits behind a
//! mutex that is never held across an await. Every timed wait races the
//! injected input capability against the session's stop signal, so an
//! explicit stop cancels any pending wait deterministically.

use crate::channel::{ChannelSink, Choice, ChoicePrompt, InputSource};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::player::{Player, PlayerId};
use crate::score::ScoreStore;
use crate::words::Lexicon;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Number of fixed rounds before the extra-round vote.
const FIXED_ROUNDS: u32 = 3;

/// Choice id for "play one more round" in the extra-round mini-vote.
const CHOICE_EXTRA_ROUND: &str = "extra_round";
/// Choice id for "vote now" in the extra-round mini-vote.
const CHOICE_VOTE_NOW: &str = "vote_now";

/// Phase of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Phase {
    /// Accepting joins until the join window closes.
    Lobby,
    /// Question/answer rounds in progress.
    Playing,
    /// Imposter vote open.
    Voting,
    /// Imposters guessing the secret word.
    Guessing,
    /// Terminal. The end-of-game hook has fired (or is about to).
    Ended,
}

/// A winning faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Faction {
    /// Players who know the secret word.
    #[strum(serialize = "crew")]
    Crew,
    /// Players who do not know the secret word.
    #[strum(serialize = "imposter")]
    Imposter,
}

/// Result of a join attempt, so callers can render distinct feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player was seated.
    Admitted,
    /// The player was already seated; the roster is unchanged.
    AlreadyJoined,
    /// The lobby is at capacity (or no longer accepting joins).
    Full,
}

impl JoinOutcome {
    /// Maps a rejection onto the error taxonomy; `None` for an admit.
    pub fn as_error(&self) -> Option<GameError> {
        match self {
            JoinOutcome::Admitted => None,
            JoinOutcome::AlreadyJoined => Some(GameError::DuplicateJoin),
            JoinOutcome::Full => Some(GameError::CapacityExceeded),
        }
    }
}

/// How a round loop finished.
enum RoundEnd {
    /// Fewer than two eligible players remained; the round is exhausted.
    Exhausted,
    /// An elimination decided the game mid-round.
    Decided(Faction),
    /// The session was torn down externally.
    Aborted,
}

/// End-of-game hook, fired exactly once when the session reaches `Ended`.
pub type EndHook = Box<dyn FnOnce() + Send>;

struct SessionState {
    phase: Phase,
    /// Seated players in join order. Elimination removes from here only.
    players: Vec<Player>,
    /// Snapshot of the players assigned the imposter role, fixed once at
    /// role assignment. Elimination never touches this list, so team-wide
    /// scoring and reveals still reach eliminated imposters.
    imposters: Vec<Player>,
    secret_word: Option<String>,
    round: u32,
    on_end: Option<EndHook>,
}

/// One running game, bound to one channel.
pub struct GameSession {
    key: String,
    host: PlayerId,
    config: GameConfig,
    lexicon: Lexicon,
    channel: Arc<dyn ChannelSink>,
    input: Arc<dyn InputSource>,
    scores: Arc<dyn ScoreStore>,
    state: Mutex<SessionState>,
    stop: watch::Sender<bool>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("key", &self.key)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Creates a session in the lobby phase.
    ///
    /// The host is not seated automatically; they join like everyone else.
    pub fn new(
        key: impl Into<String>,
        host: impl Into<PlayerId>,
        config: GameConfig,
        lexicon: Lexicon,
        channel: Arc<dyn ChannelSink>,
        input: Arc<dyn InputSource>,
        scores: Arc<dyn ScoreStore>,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            key: key.into(),
            host: host.into(),
            config,
            lexicon,
            channel,
            input,
            scores,
            state: Mutex::new(SessionState {
                phase: Phase::Lobby,
                players: Vec::new(),
                imposters: Vec::new(),
                secret_word: None,
                round: 0,
                on_end: None,
            }),
            stop,
        }
    }

    /// Channel key this session is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The player who opened the lobby.
    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap().phase
    }

    /// Current round number (0 before the first round starts).
    pub fn round(&self) -> u32 {
        self.state.lock().unwrap().round
    }

    /// Number of seated players.
    pub fn player_count(&self) -> usize {
        self.state.lock().unwrap().players.len()
    }

    /// Snapshot of the seated players, in join order.
    pub fn players(&self) -> Vec<Player> {
        self.state.lock().unwrap().players.clone()
    }

    /// Snapshot of the original imposter team, eliminated members included.
    /// Empty until roles are assigned.
    pub fn imposters(&self) -> Vec<Player> {
        self.state.lock().unwrap().imposters.clone()
    }

    /// The secret word, once drawn.
    pub fn secret_word(&self) -> Option<String> {
        self.state.lock().unwrap().secret_word.clone()
    }

    /// Registers the hook invoked exactly once when the session ends.
    /// Replaces any previously registered hook.
    pub fn set_on_end(&self, hook: impl FnOnce() + Send + 'static) {
        self.state.lock().unwrap().on_end = Some(Box::new(hook));
    }

    /// Seats a player while the lobby is open.
    ///
    /// Duplicate identities and over-capacity joins are no-ops reported
    /// through the returned [`JoinOutcome`]. Once the lobby has closed the
    /// roster is sealed and further joins report `Full`.
    #[instrument(skip_all, fields(session = %self.key))]
    pub fn join(&self, id: impl Into<PlayerId>, name: impl Into<String>) -> JoinOutcome {
        let id = id.into();
        let mut state = self.state.lock().unwrap();

        if state.phase != Phase::Lobby {
            debug!(player = %id, phase = %state.phase, "Join rejected, lobby closed");
            return JoinOutcome::Full;
        }
        if state.players.iter().any(|p| p.id == id) {
            debug!(player = %id, "Join rejected, duplicate identity");
            return JoinOutcome::AlreadyJoined;
        }
        if state.players.len() >= *self.config.max_players() {
            debug!(player = %id, "Join rejected, lobby at capacity");
            return JoinOutcome::Full;
        }

        state.players.push(Player::new(id.clone(), name));
        info!(player = %id, players = state.players.len(), "Player joined");
        JoinOutcome::Admitted
    }

    /// Closes the lobby and drives the game to completion.
    ///
    /// Called once by the embedder when the join window elapses. Runs the
    /// whole state machine: role assignment, rounds, the extra-round vote,
    /// voting, guessing, and finally the end-of-game hook. With fewer than
    /// the minimum player count the game is cancelled immediately.
    #[instrument(skip(self), fields(session = %self.key))]
    pub async fn start(&self) {
        {
            let state = self.state.lock().unwrap();
            if state.phase != Phase::Lobby {
                warn!(phase = %state.phase, "start() called outside the lobby phase");
                return;
            }
        }

        if self.player_count() < *self.config.min_players() {
            info!(
                players = self.player_count(),
                min = *self.config.min_players(),
                "Not enough players; cancelling"
            );
            self.notify(&format!(
                "Not enough players joined; the game is cancelled (minimum {}).",
                self.config.min_players()
            ))
            .await;
            self.finish().await;
            return;
        }

        let (roster, imposter_count, word) = self.assign_roles();
        self.notify(&format!(
            "🚀 The game has begun! There are {} imposter(s) among you. \
             Check your private messages for your role.",
            imposter_count
        ))
        .await;

        for player in &roster {
            let msg = if player.is_imposter {
                "🤫 You are the **imposter**! You do not know the secret word. \
                 Try not to give yourself away."
                    .to_string()
            } else {
                format!("You are crew. The secret word is: **{}**", word)
            };
            if let Err(e) = self.channel.send_private(&player.id, &msg).await {
                warn!(player = %player.id, error = %e, "Failed to deliver role message");
            }
        }

        for round in 1..=FIXED_ROUNDS {
            match self.play_round(round).await {
                RoundEnd::Exhausted => {}
                RoundEnd::Decided(_) => {
                    self.run_guessing().await;
                    self.finish().await;
                    return;
                }
                RoundEnd::Aborted => {
                    self.finish().await;
                    return;
                }
            }
        }

        match self.ask_extra_round().await {
            Ok(true) => match self.play_round(FIXED_ROUNDS + 1).await {
                RoundEnd::Exhausted => {}
                RoundEnd::Decided(_) => {
                    self.run_guessing().await;
                    self.finish().await;
                    return;
                }
                RoundEnd::Aborted => {
                    self.finish().await;
                    return;
                }
            },
            Ok(false) => {}
            Err(_) => {
                self.finish().await;
                return;
            }
        }

        if self.run_voting().await.is_err() {
            self.finish().await;
            return;
        }

        self.run_guessing().await;
        self.finish().await;
    }

    /// Forces the session to its terminal state.
    ///
    /// Only the host or an administrator may stop a game. Cancels any
    /// pending wait (which then surfaces as [`GameError::Aborted`], never as
    /// a timeout) and fires the end-of-game hook. Safe to call repeatedly.
    #[instrument(skip(self), fields(session = %self.key, actor = %actor))]
    pub async fn stop(&self, actor: &PlayerId, is_admin: bool) -> Result<(), GameError> {
        if !is_admin && actor != &self.host {
            warn!("Unauthorized stop attempt");
            return Err(GameError::NotAuthorized);
        }

        let already_ended = self.phase() == Phase::Ended;
        self.finish().await;
        if !already_ended {
            info!("Session stopped by request");
            self.notify("🛑 The game has been stopped.").await;
        }
        Ok(())
    }

    // ── Role assignment ──────────────────────────────────────────

    /// Shuffles the roster, flags the tier count of imposters, and draws the
    /// secret word. Returns the updated roster, the imposter count, and the
    /// word so the caller can deliver role messages.
    #[instrument(skip(self), fields(session = %self.key))]
    fn assign_roles(&self) -> (Vec<Player>, usize, String) {
        let word = self.lexicon.random_word().to_string();
        let mut state = self.state.lock().unwrap();

        let count = state.players.len();
        let imposter_count = self.config.imposter_count(count);

        let mut ids: Vec<PlayerId> = state.players.iter().map(|p| p.id.clone()).collect();
        ids.shuffle(&mut rand::thread_rng());

        for id in ids.iter().take(imposter_count) {
            if let Some(player) = state.players.iter_mut().find(|p| &p.id == id) {
                player.is_imposter = true;
            }
        }
        state.imposters = state
            .players
            .iter()
            .filter(|p| p.is_imposter)
            .cloned()
            .collect();
        state.secret_word = Some(word.clone());
        state.phase = Phase::Playing;

        info!(players = count, imposters = imposter_count, "Roles assigned");
        (state.players.clone(), imposter_count, word)
    }

    // ── Rounds ───────────────────────────────────────────────────

    /// Runs one round of paired question/answer exchanges.
    ///
    /// Pairs are drawn at random without replacement within the round; the
    /// round ends when fewer than two unpaired players remain. The draw is
    /// deliberately not fairness-balanced across rounds.
    #[instrument(skip(self), fields(session = %self.key, round))]
    async fn play_round(&self, round: u32) -> RoundEnd {
        let mut available: Vec<PlayerId> = {
            let mut state = self.state.lock().unwrap();
            if state.phase == Phase::Ended {
                return RoundEnd::Aborted;
            }
            state.round = round;
            for player in &mut state.players {
                player.has_acted_this_round = false;
            }
            state.players.iter().map(|p| p.id.clone()).collect()
        };

        self.notify(&format!("Round {} has started!", round)).await;

        loop {
            if self.phase() == Phase::Ended {
                return RoundEnd::Aborted;
            }

            // Players eliminated earlier in the round are no longer pairable.
            {
                let state = self.state.lock().unwrap();
                available.retain(|id| state.players.iter().any(|p| &p.id == id));
            }
            if available.len() < 2 {
                debug!(remaining = available.len(), "Round exhausted");
                return RoundEnd::Exhausted;
            }

            let asker = {
                let idx = rand::thread_rng().gen_range(0..available.len());
                available.remove(idx)
            };
            let answerer = {
                let idx = rand::thread_rng().gen_range(0..available.len());
                available.remove(idx)
            };

            self.notify(&format!(
                "🔴 {}, ask {} a question! You each have {} seconds.",
                self.display_name(&asker),
                self.display_name(&answerer),
                self.config.round_duration_secs()
            ))
            .await;

            match self.wait_message(&asker).await {
                Ok(_question) => self.mark_acted(&asker),
                Err(GameError::InputTimeout) => {
                    if let Some(winner) = self.eliminate(&asker).await {
                        return RoundEnd::Decided(winner);
                    }
                    continue;
                }
                Err(_) => return RoundEnd::Aborted,
            }

            match self.wait_message(&answerer).await {
                Ok(_answer) => self.mark_acted(&answerer),
                Err(GameError::InputTimeout) => {
                    if let Some(winner) = self.eliminate(&answerer).await {
                        return RoundEnd::Decided(winner);
                    }
                }
                Err(_) => return RoundEnd::Aborted,
            }
        }
    }

    /// Removes a player from the game, reveals their faction, and
    /// re-evaluates win conditions. Returns the winning faction if the
    /// elimination decided the game (scoring already applied).
    #[instrument(skip(self), fields(session = %self.key, player = %id))]
    async fn eliminate(&self, id: &PlayerId) -> Option<Faction> {
        let (name, was_imposter, winner) = {
            let mut state = self.state.lock().unwrap();
            let idx = state.players.iter().position(|p| &p.id == id)?;
            let player = state.players.remove(idx);

            let imposters_left = state.players.iter().filter(|p| p.is_imposter).count();
            let crew_left = state.players.len() - imposters_left;

            let winner = if player.is_imposter && imposters_left == 0 {
                Some(Faction::Crew)
            } else if imposters_left >= crew_left || state.players.len() < 2 {
                Some(Faction::Imposter)
            } else {
                None
            };

            info!(
                was_imposter = player.is_imposter,
                imposters_left,
                crew_left,
                winner = ?winner,
                "Player eliminated"
            );
            (player.name, player.is_imposter, winner)
        };

        let faction = if was_imposter { "an imposter" } else { "crew" };
        self.notify(&format!(
            "⏰ {} took too long and is out of the game. They were {}!",
            name, faction
        ))
        .await;

        match winner {
            Some(Faction::Crew) => {
                self.notify("🎉 The crew wins! All imposters are out.").await;
                self.award(Faction::Crew);
            }
            Some(Faction::Imposter) => {
                self.notify("🔪 The imposters win! The crew is outnumbered.")
                    .await;
                self.award(Faction::Imposter);
            }
            None => {}
        }
        winner
    }

    // ── Extra-round vote ─────────────────────────────────────────

    /// Runs the timed majority mini-vote on a fourth round.
    ///
    /// One vote per seated player. Ties, including the no-vote case, fall to
    /// "vote now": an extra round needs strictly more votes.
    #[instrument(skip(self), fields(session = %self.key))]
    async fn ask_extra_round(&self) -> Result<bool, GameError> {
        let eligible = self.player_ids();
        let make_choices = |extra: usize, vote_now: usize| {
            vec![
                Choice::new(CHOICE_EXTRA_ROUND, format!("One more round ({})", extra)),
                Choice::new(CHOICE_VOTE_NOW, format!("Vote now ({})", vote_now)),
            ]
        };

        let prompt = self
            .send_prompt(
                "Round 3 is over. Play one more round, or vote now?",
                &make_choices(0, 0),
            )
            .await;

        let mut extra = 0usize;
        let mut vote_now = 0usize;
        let mut voters: HashSet<PlayerId> = HashSet::new();
        let deadline = Instant::now() + self.config.extra_round_vote_timeout();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.wait_choice(&eligible, remaining).await {
                Ok((voter, value)) => {
                    if voters.contains(&voter) {
                        self.whisper(&voter, "You have already voted!").await;
                        continue;
                    }
                    match value.as_str() {
                        CHOICE_EXTRA_ROUND => extra += 1,
                        CHOICE_VOTE_NOW => vote_now += 1,
                        other => {
                            debug!(value = other, "Ignoring unknown choice");
                            continue;
                        }
                    }
                    voters.insert(voter);
                    self.update_prompt(&prompt, &make_choices(extra, vote_now))
                        .await;
                }
                Err(GameError::InputTimeout) => break,
                Err(e) => return Err(e),
            }
        }

        let play_extra = extra > vote_now;
        info!(extra, vote_now, play_extra, "Extra-round vote resolved");
        if play_extra {
            self.notify("One more round it is!").await;
        } else {
            self.notify("Moving on to the vote.").await;
        }
        Ok(play_extra)
    }

    // ── Voting ───────────────────────────────────────────────────

    /// Runs the imposter vote: one choice per seated player, live tallies,
    /// one vote per seated voter, closed by the vote timeout.
    ///
    /// The strictly highest tally is voted out; exact ties break to the
    /// first maximum seen in first-vote order. That tie-break is
    /// deterministic but arbitrary, not a fairness guarantee. No votes at
    /// all hand the win to the imposters.
    #[instrument(skip(self), fields(session = %self.key))]
    async fn run_voting(&self) -> Result<(), GameError> {
        {
            let mut state = self.state.lock().unwrap();
            if state.phase == Phase::Ended {
                return Err(GameError::Aborted);
            }
            state.phase = Phase::Voting;
        }
        info!("Voting phase started");
        self.notify("🗳️ Time to vote! Who is the imposter?").await;

        let candidates: Vec<(PlayerId, String)> = {
            let state = self.state.lock().unwrap();
            state
                .players
                .iter()
                .map(|p| (p.id.clone(), p.name.clone()))
                .collect()
        };
        let eligible: Vec<PlayerId> = candidates.iter().map(|(id, _)| id.clone()).collect();

        // First-vote insertion order; the tie-break depends on it.
        let mut tally: Vec<(PlayerId, u32)> = Vec::new();
        let mut voters: HashSet<PlayerId> = HashSet::new();

        let make_choices = |tally: &Vec<(PlayerId, u32)>| {
            candidates
                .iter()
                .map(|(id, name)| {
                    let count = tally
                        .iter()
                        .find(|(tid, _)| tid == id)
                        .map(|(_, n)| *n)
                        .unwrap_or(0);
                    Choice::new(id.clone(), format!("{} ({})", name, count))
                })
                .collect::<Vec<_>>()
        };

        let prompt = self
            .send_prompt("Cast your vote:", &make_choices(&tally))
            .await;

        let deadline = Instant::now() + self.config.vote_timeout();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.wait_choice(&eligible, remaining).await {
                Ok((voter, target)) => {
                    if voters.contains(&voter) {
                        self.whisper(&voter, "You have already voted!").await;
                        continue;
                    }
                    if !candidates.iter().any(|(id, _)| id == &target) {
                        debug!(target = %target, "Ignoring vote for unknown candidate");
                        continue;
                    }
                    voters.insert(voter);
                    match tally.iter_mut().find(|(id, _)| id == &target) {
                        Some(entry) => entry.1 += 1,
                        None => tally.push((target, 1)),
                    }
                    self.update_prompt(&prompt, &make_choices(&tally)).await;
                }
                Err(GameError::InputTimeout) => break,
                Err(e) => return Err(e),
            }
        }

        // First maximum seen wins exact ties.
        let mut top: Option<(PlayerId, u32)> = None;
        for (id, count) in &tally {
            if top.as_ref().map_or(true, |(_, best)| count > best) {
                top = Some((id.clone(), *count));
            }
        }

        match top {
            None => {
                info!("No votes cast; imposters win by default");
                self.notify("No votes were cast. The imposters win by default!")
                    .await;
                self.reveal_imposters().await;
                self.award(Faction::Imposter);
            }
            Some((voted_out, count)) => {
                let (name, was_imposter) = {
                    let state = self.state.lock().unwrap();
                    state
                        .players
                        .iter()
                        .find(|p| p.id == voted_out)
                        .map(|p| (p.name.clone(), p.is_imposter))
                        .unwrap_or((voted_out.clone(), false))
                };
                info!(voted_out = %voted_out, votes = count, was_imposter, "Vote resolved");

                if was_imposter {
                    self.notify(&format!("🎉 The crew wins! The imposter was {}.", name))
                        .await;
                    self.award(Faction::Crew);
                } else {
                    self.notify(&format!("🔪 The imposters win! {} was innocent.", name))
                        .await;
                    self.reveal_imposters().await;
                    self.award(Faction::Imposter);
                }
            }
        }
        Ok(())
    }

    // ── Guessing ─────────────────────────────────────────────────

    /// Runs the imposter word-guessing mini-phase.
    ///
    /// Skipped entirely when no imposter remains seated. The secret word is
    /// shuffled among three decoys; the first answer from any remaining
    /// imposter decides for the whole team. A correct guess pays the bonus
    /// to every original imposter, eliminated ones included.
    ///
    /// The prompt itself goes out publicly; who can see or press the
    /// choices is up to the [`ChannelSink`] embedder, while the eligibility
    /// set passed to the input wait restricts whose answer counts.
    #[instrument(skip(self), fields(session = %self.key))]
    async fn run_guessing(&self) {
        let (remaining, secret) = {
            let state = self.state.lock().unwrap();
            if state.phase == Phase::Ended {
                return;
            }
            let remaining: Vec<PlayerId> = state
                .players
                .iter()
                .filter(|p| p.is_imposter)
                .map(|p| p.id.clone())
                .collect();
            (remaining, state.secret_word.clone())
        };
        let Some(secret) = secret else {
            return;
        };
        if remaining.is_empty() {
            info!("No imposters remain; skipping the guess phase");
            return;
        }

        {
            let mut state = self.state.lock().unwrap();
            state.phase = Phase::Guessing;
        }
        info!("Guessing phase started");

        let mut options = self.lexicon.distractors(&secret, 3);
        options.push(secret.clone());
        options.shuffle(&mut rand::thread_rng());
        let choices: Vec<Choice> = options
            .iter()
            .map(|word| Choice::new(word.clone(), word.clone()))
            .collect();

        let _prompt = self
            .send_prompt(
                "Imposters, one chance for a bonus: which was the secret word?",
                &choices,
            )
            .await;

        match self
            .wait_choice(&remaining, self.config.guess_timeout())
            .await
        {
            Ok((guesser, guess)) if guess == secret => {
                info!(guesser = %guesser, "Imposters guessed the secret word");
                self.notify("🎯 The imposters guessed the secret word! Bonus points awarded.")
                    .await;
                let imposters = self.imposters();
                for imposter in &imposters {
                    self.scores
                        .add(&imposter.id, *self.config.guess_bonus_points());
                }
            }
            Ok((guesser, guess)) => {
                info!(guesser = %guesser, guess = %guess, "Wrong guess");
                self.notify(&format!(
                    "❌ Wrong guess! The secret word was **{}**.",
                    secret
                ))
                .await;
            }
            Err(GameError::InputTimeout) => {
                info!("Guess phase timed out");
                self.notify(&format!("⌛ Time's up! The secret word was **{}**.", secret))
                    .await;
            }
            Err(_) => {}
        }
    }

    // ── Scoring ──────────────────────────────────────────────────

    /// Applies the win-evaluation scoring rule: crew wins pay every seated
    /// non-imposter; imposter wins pay every original imposter.
    #[instrument(skip(self), fields(session = %self.key, winner = %winner))]
    fn award(&self, winner: Faction) {
        let state = self.state.lock().unwrap();
        match winner {
            Faction::Crew => {
                for player in state.players.iter().filter(|p| !p.is_imposter) {
                    self.scores.add(&player.id, *self.config.crew_win_points());
                }
            }
            Faction::Imposter => {
                for imposter in &state.imposters {
                    self.scores
                        .add(&imposter.id, *self.config.imposter_win_points());
                }
            }
        }
        info!("Points awarded");
    }

    // ── Timed waits ──────────────────────────────────────────────

    /// Waits for a message from one player, racing the stop signal.
    async fn wait_message(&self, from: &PlayerId) -> Result<String, GameError> {
        let timeout = self.config.round_duration();
        let mut stopped = self.stop.subscribe();
        tokio::select! {
            _ = stopped.wait_for(|s| *s) => Err(GameError::Aborted),
            msg = self.input.await_message(from, timeout) => {
                if self.phase() == Phase::Ended {
                    return Err(GameError::Aborted);
                }
                msg.ok_or(GameError::InputTimeout)
            }
        }
    }

    /// Waits for a choice from any eligible player, racing the stop signal.
    async fn wait_choice(
        &self,
        eligible: &[PlayerId],
        timeout: Duration,
    ) -> Result<(PlayerId, String), GameError> {
        let mut stopped = self.stop.subscribe();
        tokio::select! {
            _ = stopped.wait_for(|s| *s) => Err(GameError::Aborted),
            choice = self.input.await_choice(eligible, timeout) => {
                if self.phase() == Phase::Ended {
                    return Err(GameError::Aborted);
                }
                choice.ok_or(GameError::InputTimeout)
            }
        }
    }

    // ── Teardown ─────────────────────────────────────────────────

    /// Transitions to `Ended`, cancels any pending wait, and fires the
    /// end-of-game hook. Idempotent; the hook fires at most once.
    async fn finish(&self) {
        let on_end = {
            let mut state = self.state.lock().unwrap();
            if state.phase != Phase::Ended {
                info!(session = %self.key, from = %state.phase, "Session ended");
            }
            state.phase = Phase::Ended;
            state.on_end.take()
        };
        // Wakes any wait still racing the stop signal.
        let _ = self.stop.send(true);
        if let Some(hook) = on_end {
            hook();
        }
    }

    // ── Outbound helpers ─────────────────────────────────────────

    /// Sends a public notice; delivery failures are logged and swallowed so
    /// one failed message never halts the state machine.
    async fn notify(&self, content: &str) {
        if let Err(e) = self.channel.send(content).await {
            warn!(session = %self.key, error = %e, "Failed to deliver channel notice");
        }
    }

    /// Sends a private notice to one player, same failure policy.
    async fn whisper(&self, to: &PlayerId, content: &str) {
        if let Err(e) = self.channel.send_private(to, content).await {
            warn!(session = %self.key, player = %to, error = %e, "Failed to deliver private notice");
        }
    }

    /// Sends a choice prompt; a failed send degrades to collecting without
    /// live tally updates.
    async fn send_prompt(
        &self,
        content: &str,
        choices: &[Choice],
    ) -> Option<Box<dyn ChoicePrompt>> {
        match self.channel.send_with_choices(content, choices).await {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                warn!(session = %self.key, error = %e, "Failed to send choice prompt");
                None
            }
        }
    }

    /// Pushes updated labels to a prompt, if one was delivered.
    async fn update_prompt(&self, prompt: &Option<Box<dyn ChoicePrompt>>, choices: &[Choice]) {
        if let Some(prompt) = prompt {
            if let Err(e) = prompt.update(choices).await {
                warn!(session = %self.key, error = %e, "Failed to update choice prompt");
            }
        }
    }

    /// Announces the original imposter team by name.
    async fn reveal_imposters(&self) {
        let names: Vec<String> = self.imposters().iter().map(|p| p.name.clone()).collect();
        if !names.is_empty() {
            self.notify(&format!("The real imposters were: {}.", names.join(", ")))
                .await;
        }
    }

    // ── Small accessors ──────────────────────────────────────────

    fn player_ids(&self) -> Vec<PlayerId> {
        self.state
            .lock()
            .unwrap()
            .players
            .iter()
            .map(|p| p.id.clone())
            .collect()
    }

    fn display_name(&self, id: &PlayerId) -> String {
        self.state
            .lock()
            .unwrap()
            .players
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.clone())
    }

    fn mark_acted(&self, id: &PlayerId) {
        let mut state = self.state.lock().unwrap();
        if let Some(player) = state.players.iter_mut().find(|p| &p.id == id) {
            player.has_acted_this_round = true;
        }
    }
}
