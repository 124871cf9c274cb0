//! Menu choices awaiting an answer.
//!
//! A pending choice is keyed by a random correlation id and bound to the actor
//! who was asked. Only that actor can answer it; it expires after a TTL and is
//! dropped when the actor leaves.

use super::args::Args;
use super::context::ChoiceContinuation;
use super::output::OutputRef;
use crate::state::PlayerId;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("no such pending choice")]
    Unknown,
    #[error("that choice has expired")]
    Expired,
    #[error("that choice belongs to another player")]
    WrongActor,
}

/// Arguments parsed so far, plus player tokens still to resolve.
#[derive(Debug, Default)]
pub struct PartialArgs {
    pub args: Args,
    pub unresolved: VecDeque<(&'static str, String)>,
}

pub enum PendingKind {
    /// An ambiguous player argument; the answer indexes `candidates`.
    Argument {
        command: &'static str,
        arg: &'static str,
        candidates: Vec<PlayerId>,
        partial: PartialArgs,
    },
    /// A handler asked the actor to pick.
    Handler {
        command: &'static str,
        continuation: Box<dyn ChoiceContinuation>,
    },
}

impl PendingKind {
    pub fn command(&self) -> &'static str {
        match self {
            Self::Argument { command, .. } | Self::Handler { command, .. } => command,
        }
    }
}

pub struct PendingChoice {
    pub actor: PlayerId,
    pub output: OutputRef,
    pub kind: PendingKind,
    created: Instant,
}

impl PendingChoice {
    pub fn new(actor: PlayerId, output: OutputRef, kind: PendingKind) -> Self {
        Self {
            actor,
            output,
            kind,
            created: Instant::now(),
        }
    }
}

pub struct PendingChoices {
    entries: DashMap<Uuid, PendingChoice>,
    ttl: Duration,
}

impl PendingChoices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&self, choice: PendingChoice) -> Uuid {
        self.sweep();
        let id = Uuid::new_v4();
        debug!(%id, actor = %choice.actor, command = choice.kind.command(), "Choice pending");
        self.entries.insert(id, choice);
        id
    }

    /// Remove and return the choice if `chooser` is the actor it was asked of.
    pub fn take(&self, id: &Uuid, chooser: &PlayerId) -> Result<PendingChoice, ChoiceError> {
        match self.entries.remove_if(id, |_, c| c.actor == *chooser) {
            Some((_, choice)) if choice.created.elapsed() > self.ttl => Err(ChoiceError::Expired),
            Some((_, choice)) => Ok(choice),
            None if self.entries.contains_key(id) => Err(ChoiceError::WrongActor),
            None => Err(ChoiceError::Unknown),
        }
    }

    /// Drop every choice pending for `actor`. Returns how many were dropped.
    pub fn cancel_for(&self, actor: &PlayerId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, c| c.actor != *actor);
        before.saturating_sub(self.entries.len())
    }

    /// Drop expired choices. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, c| c.created.elapsed() <= ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::core::Output;
    use std::sync::Arc;

    struct Silent;
    impl Output for Silent {
        fn success(&self, _: &str) {}
        fn fail(&self, _: &str) {}
        fn plain(&self, _: &str) {}
    }

    fn choice(actor: &str) -> PendingChoice {
        PendingChoice::new(
            PlayerId::new(actor),
            Arc::new(Silent),
            PendingKind::Argument {
                command: "mute",
                arg: "player",
                candidates: vec![PlayerId::new("a"), PlayerId::new("b")],
                partial: PartialArgs::default(),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_asked_actor_can_answer() {
        let pending = PendingChoices::new(Duration::from_secs(60));
        let id = pending.insert(choice("mod"));
        assert_eq!(
            pending.take(&id, &PlayerId::new("other")).err(),
            Some(ChoiceError::WrongActor)
        );
        assert!(pending.take(&id, &PlayerId::new("mod")).is_ok());
        assert_eq!(
            pending.take(&id, &PlayerId::new("mod")).err(),
            Some(ChoiceError::Unknown)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn choices_expire() {
        let pending = PendingChoices::new(Duration::from_secs(60));
        let id = pending.insert(choice("mod"));
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(
            pending.take(&id, &PlayerId::new("mod")).err(),
            Some(ChoiceError::Expired)
        );
        assert!(pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_for_drops_only_that_actor() {
        let pending = PendingChoices::new(Duration::from_secs(60));
        pending.insert(choice("a"));
        pending.insert(choice("a"));
        pending.insert(choice("b"));
        assert_eq!(pending.cancel_for(&PlayerId::new("a")), 2);
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_on_insert() {
        let pending = PendingChoices::new(Duration::from_secs(10));
        pending.insert(choice("a"));
        tokio::time::advance(Duration::from_secs(11)).await;
        pending.insert(choice("b"));
        assert_eq!(pending.len(), 1);
    }
}
