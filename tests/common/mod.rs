//! Shared test doubles for the capability traits.
//!
//! The channel records every outbound delivery; the input source is scripted
//! so whole games run deterministically without real timers.

#![allow(dead_code)]

use async_trait::async_trait;
use imposter::{ChannelSink, Choice, ChoicePrompt, GameSession, InputSource, PlayerId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

/// One outbound delivery recorded by [`MockChannel`].
#[derive(Debug, Clone)]
pub enum Sent {
    /// Public channel notice.
    Public(String),
    /// Private notice to one player.
    Private(PlayerId, String),
    /// Choice prompt with its initial choices.
    Prompt(String, Vec<Choice>),
    /// Live relabel of a previously sent prompt.
    PromptUpdate(Vec<Choice>),
}

/// Channel sink that records everything it is asked to deliver.
#[derive(Default)]
pub struct MockChannel {
    log: Arc<Mutex<Vec<Sent>>>,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn transcript(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn saw_public(&self, needle: &str) -> bool {
        self.transcript()
            .iter()
            .any(|s| matches!(s, Sent::Public(m) if m.contains(needle)))
    }

    pub fn saw_prompt(&self, needle: &str) -> bool {
        self.transcript()
            .iter()
            .any(|s| matches!(s, Sent::Prompt(m, _) if m.contains(needle)))
    }

    pub fn saw_private(&self, to: &str, needle: &str) -> bool {
        self.transcript()
            .iter()
            .any(|s| matches!(s, Sent::Private(p, m) if p.as_str() == to && m.contains(needle)))
    }
}

struct MockPrompt {
    log: Arc<Mutex<Vec<Sent>>>,
}

#[async_trait]
impl ChoicePrompt for MockPrompt {
    async fn update(&self, choices: &[Choice]) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(Sent::PromptUpdate(choices.to_vec()));
        Ok(())
    }
}

#[async_trait]
impl ChannelSink for MockChannel {
    async fn send(&self, content: &str) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(Sent::Public(content.to_string()));
        Ok(())
    }

    async fn send_with_choices(
        &self,
        content: &str,
        choices: &[Choice],
    ) -> anyhow::Result<Box<dyn ChoicePrompt>> {
        self.log
            .lock()
            .unwrap()
            .push(Sent::Prompt(content.to_string(), choices.to_vec()));
        Ok(Box::new(MockPrompt {
            log: self.log.clone(),
        }))
    }

    async fn send_private(&self, to: &PlayerId, content: &str) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(Sent::Private(to.clone(), content.to_string()));
        Ok(())
    }
}

/// How the scripted input answers round message waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePolicy {
    /// Every solicited player answers immediately.
    AlwaysReply,
    /// Imposters never answer; crew answer immediately.
    ImpostersSilent,
    /// Only the first assigned imposter stays silent.
    FirstImposterSilent,
    /// Nobody ever answers and the wait never resolves (stop tests).
    Hang,
}

/// One scripted response for a choice wait, resolved in FIFO order.
/// An exhausted script always times out.
pub enum ChoiceScript {
    /// A specific player picks a specific choice id.
    Pick(&'static str, &'static str),
    /// The first crew member (by join order) votes for themselves.
    VoteFirstCrew,
    /// The first remaining imposter picks the secret word.
    CorrectGuess,
    /// The first remaining imposter picks a wrong word.
    WrongGuess,
    /// Nobody responds before the deadline.
    Timeout,
}

/// Scripted input source. Message waits follow a fixed policy (some need the
/// session bound first, to look up roles); choice waits pop from a script.
pub struct MockInput {
    policy: MessagePolicy,
    session: OnceLock<Arc<GameSession>>,
    choices: Mutex<VecDeque<ChoiceScript>>,
}

impl MockInput {
    pub fn new(policy: MessagePolicy) -> Arc<Self> {
        Arc::new(Self {
            policy,
            session: OnceLock::new(),
            choices: Mutex::new(VecDeque::new()),
        })
    }

    /// Binds the session so role-aware policies and scripts can inspect it.
    pub fn bind(&self, session: Arc<GameSession>) {
        let _ = self.session.set(session);
    }

    pub fn script(&self, entry: ChoiceScript) {
        self.choices.lock().unwrap().push_back(entry);
    }

    fn session(&self) -> &Arc<GameSession> {
        self.session.get().expect("MockInput not bound to a session")
    }

    fn first_remaining_imposter(&self) -> Option<PlayerId> {
        self.session()
            .players()
            .into_iter()
            .find(|p| p.is_imposter)
            .map(|p| p.id)
    }
}

#[async_trait]
impl InputSource for MockInput {
    async fn await_message(&self, from: &PlayerId, _timeout: Duration) -> Option<String> {
        match self.policy {
            MessagePolicy::AlwaysReply => Some(format!("a message from {}", from)),
            MessagePolicy::ImpostersSilent => {
                let silent = self.session().imposters().iter().any(|p| &p.id == from);
                if silent {
                    None
                } else {
                    Some("a perfectly normal answer".to_string())
                }
            }
            MessagePolicy::FirstImposterSilent => {
                let silent = self
                    .session()
                    .imposters()
                    .first()
                    .is_some_and(|p| &p.id == from);
                if silent {
                    None
                } else {
                    Some("a perfectly normal answer".to_string())
                }
            }
            MessagePolicy::Hang => std::future::pending().await,
        }
    }

    async fn await_choice(
        &self,
        _eligible: &[PlayerId],
        _timeout: Duration,
    ) -> Option<(PlayerId, String)> {
        let entry = self.choices.lock().unwrap().pop_front()?;
        match entry {
            ChoiceScript::Pick(who, value) => Some((who.to_string(), value.to_string())),
            ChoiceScript::VoteFirstCrew => {
                let crew = self
                    .session()
                    .players()
                    .into_iter()
                    .find(|p| !p.is_imposter)?;
                Some((crew.id.clone(), crew.id))
            }
            ChoiceScript::CorrectGuess => {
                let guesser = self.first_remaining_imposter()?;
                let secret = self.session().secret_word()?;
                Some((guesser, secret))
            }
            ChoiceScript::WrongGuess => {
                let guesser = self.first_remaining_imposter()?;
                Some((guesser, "definitely-not-the-word".to_string()))
            }
            ChoiceScript::Timeout => None,
        }
    }
}
