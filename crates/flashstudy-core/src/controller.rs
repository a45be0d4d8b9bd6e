//! Study controller.
//!
//! Owns a [`Session`] and an injected [`ProgressStore`]. Transitions are
//! forwarded to the session; whenever the `(subject, mode, card index)` triple
//! changes, a snapshot is saved in a background task. Each save waits for the
//! one before it, so the store sees snapshots in transition order. Saves are
//! not retried and nobody waits for them, except [`StudyController::flush`]
//! at shutdown.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::matching::MatchSelect;
use crate::model::{Mode, ProgressSnapshot};
use crate::session::{Advance, AnswerOutcome, Session};
use crate::traits::ProgressStore;

/// Default pause between a full match selection and its verdict.
pub const DEFAULT_MATCH_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for the study controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a pair of selected match items stays on screen before the
    /// verdict is applied.
    pub match_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            match_delay: DEFAULT_MATCH_DELAY,
        }
    }
}

type PersistKey = (String, Mode, usize);

/// Session owner that mirrors progress to a store.
pub struct StudyController {
    session: Session,
    store: Arc<dyn ProgressStore>,
    config: ControllerConfig,
    last_persisted: Option<PersistKey>,
    pending_write: Option<JoinHandle<()>>,
}

impl StudyController {
    pub fn new(session: Session, store: Arc<dyn ProgressStore>, config: ControllerConfig) -> Self {
        Self {
            session,
            store,
            config,
            last_persisted: None,
            pending_write: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Apply the stored snapshot, if any.
    ///
    /// Returns whether a snapshot was applied. Load failures are logged and
    /// leave the session at its defaults.
    pub async fn restore(&mut self) -> bool {
        let snapshot = match self.store.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!(store = self.store.name(), "no saved progress");
                return false;
            }
            Err(e) => {
                tracing::warn!(
                    store = self.store.name(),
                    "failed to restore progress: {e:#}"
                );
                return false;
            }
        };

        let applied = self.session.restore(&snapshot);
        if applied {
            tracing::info!(
                subject = %snapshot.subject,
                card_index = self.session.card_index(),
                "progress restored"
            );
            self.last_persisted = persist_key(&self.session);
        }
        applied
    }

    pub fn select_subject(&mut self, id: &str) -> Result<(), SessionError> {
        self.session.select_subject(id)?;
        self.persist();
        Ok(())
    }

    pub fn leave_subject(&mut self) {
        self.session.leave_subject();
        self.last_persisted = None;
    }

    pub fn change_mode(&mut self, mode: Mode) -> Result<(), SessionError> {
        self.session.change_mode(mode)?;
        self.persist();
        Ok(())
    }

    pub fn flip(&mut self) -> Result<bool, SessionError> {
        self.session.flip()
    }

    pub fn answer(&mut self, option: &str) -> Result<AnswerOutcome, SessionError> {
        self.session.answer(option)
    }

    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        let outcome = self.session.advance()?;
        self.persist();
        Ok(outcome)
    }

    pub fn mark_known(&mut self) -> Result<Advance, SessionError> {
        let outcome = self.session.mark_known()?;
        self.persist();
        Ok(outcome)
    }

    pub fn mark_unknown(&mut self) -> Result<Advance, SessionError> {
        let outcome = self.session.mark_unknown()?;
        self.persist();
        Ok(outcome)
    }

    /// Select a match item; a completed pair is held for the match delay
    /// before its verdict is applied.
    pub async fn match_attempt(&mut self, position: usize) -> Result<MatchSelect, SessionError> {
        let outcome = self.session.match_attempt(position)?;
        if let MatchSelect::Pending { correct } = outcome {
            tracing::debug!(correct, delay = ?self.config.match_delay, "match pending");
            tokio::time::sleep(self.config.match_delay).await;
            self.session.resolve_match();
        }
        Ok(outcome)
    }

    pub fn shuffle_match_board<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.session.shuffle_match_board(rng);
    }

    /// Wait for outstanding saves.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending_write.take() {
            if let Err(e) = handle.await {
                tracing::warn!("progress save task failed: {e}");
            }
        }
    }

    fn persist(&mut self) {
        let key = persist_key(&self.session);
        if key.is_none() || key == self.last_persisted {
            return;
        }
        let Some(snapshot) = self.session.snapshot() else {
            return;
        };
        self.last_persisted = key;

        let previous = self.pending_write.take();
        let store = Arc::clone(&self.store);
        self.pending_write = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                // The previous task logs its own failures.
                let _ = previous.await;
            }
            save_snapshot(store, snapshot).await;
        }));
    }
}

async fn save_snapshot(store: Arc<dyn ProgressStore>, snapshot: ProgressSnapshot) {
    match store.save(&snapshot).await {
        Ok(()) => tracing::debug!(
            store = store.name(),
            subject = %snapshot.subject,
            card_index = snapshot.card_index,
            "progress saved"
        ),
        Err(e) => tracing::warn!(store = store.name(), "failed to save progress: {e:#}"),
    }
}

fn persist_key(session: &Session) -> Option<PersistKey> {
    Some((
        session.active_subject()?.to_string(),
        session.mode(),
        session.card_index(),
    ))
}
