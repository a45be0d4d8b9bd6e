//! Session state machine.
//!
//! A [`Session`] tracks which subject, mode and card are active, derives the
//! current flashcard, and applies scoring transitions in response to user
//! actions. It performs no I/O; persistence is layered on top by
//! [`StudyController`](crate::controller::StudyController).
//!
//! Invariants upheld by every transition:
//! - `card_index` stays within `0..len(flashcards)` of the active subject
//!   (it is 0 for an empty subject).
//! - `score <= answered`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::error::SessionError;
use crate::matching::{MatchBoard, MatchSelect};
use crate::model::{Catalog, Flashcard, Mode, ProgressSnapshot, Subject};

/// Result of [`Session::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the card at `card_index`.
    Moved { card_index: usize },
    /// Already on the last card of a test; the test is over.
    Finished(FinalScore),
    /// Already on the last card; nothing changed.
    AtEnd,
}

/// Score reported at the end of a test, rendered as `score/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub score: u32,
    pub total: usize,
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.score, self.total)
    }
}

/// Result of [`Session::answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect { expected: String },
    /// A result is already shown for this card; nothing changed.
    AlreadyAnswered,
}

/// Mutable per-visit study state over a catalog.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    active_subject: Option<String>,
    mode: Mode,
    card_index: usize,
    score: u32,
    answered: u32,
    known: BTreeSet<usize>,
    unknown: BTreeSet<usize>,
    matched_pair_count: usize,
    // Per-card transient flags.
    flipped: bool,
    selected_option: Option<String>,
    result_shown: bool,
    board: MatchBoard,
}

impl Session {
    /// A session with no subject selected.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            active_subject: None,
            mode: Mode::default(),
            card_index: 0,
            score: 0,
            answered: 0,
            known: BTreeSet::new(),
            unknown: BTreeSet::new(),
            matched_pair_count: 0,
            flipped: false,
            selected_option: None,
            result_shown: false,
            board: MatchBoard::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn active_subject(&self) -> Option<&str> {
        self.active_subject.as_deref()
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.active_subject
            .as_deref()
            .and_then(|id| self.catalog.get(id))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn card_index(&self) -> usize {
        self.card_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Test questions answered in this attempt.
    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn known(&self) -> &BTreeSet<usize> {
        &self.known
    }

    pub fn unknown(&self) -> &BTreeSet<usize> {
        &self.unknown
    }

    pub fn matched_pair_count(&self) -> usize {
        self.matched_pair_count
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    pub fn is_result_shown(&self) -> bool {
        self.result_shown
    }

    pub fn board(&self) -> &MatchBoard {
        &self.board
    }

    /// Number of cards in the active subject (0 without a subject).
    pub fn total_cards(&self) -> usize {
        self.subject().map_or(0, Subject::len)
    }

    /// The card at the current index of the active subject.
    pub fn current_flashcard(&self) -> Option<&Flashcard> {
        self.subject()?.flashcards.get(self.card_index)
    }

    pub fn is_last_card(&self) -> bool {
        self.subject()
            .and_then(Subject::last_index)
            .map_or(true, |last| self.card_index >= last)
    }

    /// Activate a subject in flashcards mode with fresh counters.
    pub fn select_subject(&mut self, id: &str) -> Result<(), SessionError> {
        if !self.catalog.contains(id) {
            return Err(SessionError::UnknownSubject(id.to_string()));
        }
        self.active_subject = Some(id.to_string());
        self.mode = Mode::Flashcards;
        self.reset_attempt();
        tracing::debug!(subject = id, "subject selected");
        Ok(())
    }

    /// Return to subject selection.
    pub fn leave_subject(&mut self) {
        self.active_subject = None;
        self.mode = Mode::default();
        self.reset_attempt();
    }

    /// Switch mode and reset per-attempt counters.
    pub fn change_mode(&mut self, mode: Mode) -> Result<(), SessionError> {
        if self.active_subject.is_none() {
            return Err(SessionError::NoActiveSubject);
        }
        self.mode = mode;
        self.reset_attempt();
        tracing::debug!(%mode, "mode changed");
        Ok(())
    }

    /// Toggle the flip (reveal answer) flag of the current card.
    pub fn flip(&mut self) -> Result<bool, SessionError> {
        self.require_subject()?;
        if !matches!(self.mode, Mode::Flashcards | Mode::Learn) {
            return Err(self.mode_mismatch("flip", Mode::Flashcards));
        }
        self.flipped = !self.flipped;
        Ok(self.flipped)
    }

    /// Pick a test option for the current card.
    pub fn answer(&mut self, option: &str) -> Result<AnswerOutcome, SessionError> {
        self.require_mode("answer", Mode::Test)?;
        if self.result_shown {
            return Ok(AnswerOutcome::AlreadyAnswered);
        }
        let card = self.require_card()?;
        let correct = card.is_correct(option);
        let expected = card.answer.clone();

        self.selected_option = Some(option.to_string());
        self.result_shown = true;
        self.answered += 1;
        if correct {
            self.score += 1;
            self.known.insert(self.card_index);
            Ok(AnswerOutcome::Correct)
        } else {
            self.unknown.insert(self.card_index);
            Ok(AnswerOutcome::Incorrect { expected })
        }
    }

    /// Move to the next card.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        let subject = self.require_subject()?;
        let total = subject.len();

        match subject.last_index() {
            Some(last) if self.card_index < last => {
                self.card_index += 1;
                self.reset_card();
                Ok(Advance::Moved {
                    card_index: self.card_index,
                })
            }
            _ if self.mode == Mode::Test => {
                let final_score = FinalScore {
                    score: self.score,
                    total,
                };
                tracing::info!(score = %final_score, "test finished");
                Ok(Advance::Finished(final_score))
            }
            _ => Ok(Advance::AtEnd),
        }
    }

    /// Record the current card as known and move on.
    pub fn mark_known(&mut self) -> Result<Advance, SessionError> {
        self.require_mode("mark known", Mode::Flashcards)?;
        self.require_card()?;
        self.known.insert(self.card_index);
        self.advance()
    }

    /// Record the current card as not known and move on.
    pub fn mark_unknown(&mut self) -> Result<Advance, SessionError> {
        self.require_mode("mark unknown", Mode::Flashcards)?;
        self.require_card()?;
        self.unknown.insert(self.card_index);
        self.advance()
    }

    /// Select a match board item.
    ///
    /// A second selection yields [`MatchSelect::Pending`]; the verdict is
    /// applied by [`resolve_match`](Self::resolve_match) after the display
    /// delay.
    pub fn match_attempt(&mut self, position: usize) -> Result<MatchSelect, SessionError> {
        self.require_mode("match", Mode::Match)?;
        if position >= self.board.len() {
            return Err(SessionError::UnknownMatchItem(position));
        }
        Ok(self.board.select(position))
    }

    /// Apply a pending match verdict. Returns `None` if nothing was pending.
    pub fn resolve_match(&mut self) -> Option<bool> {
        let correct = self.board.resolve()?;
        if correct {
            self.matched_pair_count += 1;
        }
        Some(correct)
    }

    /// Re-deal the match board in random order, clearing matches.
    pub fn shuffle_match_board<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.mode != Mode::Match {
            return;
        }
        if let Some(subject) = self.subject() {
            self.board = MatchBoard::shuffled(&subject.flashcards, rng);
            self.matched_pair_count = 0;
        }
    }

    /// The persisted view of this session, if a subject is active.
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        Some(ProgressSnapshot {
            subject: self.active_subject.clone()?,
            mode: Some(self.mode),
            card_index: self.card_index,
            score: self.score,
        })
    }

    /// Apply a persisted snapshot.
    ///
    /// Unknown subjects are ignored. The index is clamped into the subject's
    /// range and the score to the number of cards before it. Returns whether
    /// the snapshot was applied.
    pub fn restore(&mut self, snapshot: &ProgressSnapshot) -> bool {
        let Some(subject) = self.catalog.get(&snapshot.subject) else {
            tracing::warn!(subject = %snapshot.subject, "saved subject not in catalog, ignoring");
            return false;
        };
        let card_index = snapshot
            .card_index
            .min(subject.last_index().unwrap_or(0));

        self.active_subject = Some(snapshot.subject.clone());
        self.mode = snapshot.mode.unwrap_or_default();
        self.reset_attempt();
        self.card_index = card_index;
        self.answered = u32::try_from(card_index).unwrap_or(u32::MAX);
        self.score = snapshot.score.min(self.answered);
        true
    }

    fn reset_card(&mut self) {
        self.flipped = false;
        self.selected_option = None;
        self.result_shown = false;
    }

    fn reset_attempt(&mut self) {
        self.reset_card();
        self.card_index = 0;
        self.score = 0;
        self.answered = 0;
        self.known.clear();
        self.unknown.clear();
        self.matched_pair_count = 0;
        self.board = match self.subject() {
            Some(subject) if self.mode == Mode::Match => MatchBoard::new(&subject.flashcards),
            _ => MatchBoard::default(),
        };
    }

    fn require_subject(&self) -> Result<&Subject, SessionError> {
        self.subject().ok_or(SessionError::NoActiveSubject)
    }

    fn require_mode(&self, action: &'static str, expected: Mode) -> Result<(), SessionError> {
        self.require_subject()?;
        if self.mode != expected {
            return Err(self.mode_mismatch(action, expected));
        }
        Ok(())
    }

    fn require_card(&self) -> Result<&Flashcard, SessionError> {
        let subject = self.require_subject()?;
        subject.flashcards.get(self.card_index).ok_or_else(|| {
            SessionError::EmptySubject(self.active_subject.clone().unwrap_or_default())
        })
    }

    fn mode_mismatch(&self, action: &'static str, expected: Mode) -> SessionError {
        SessionError::ModeMismatch {
            action,
            expected,
            actual: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{IgnoreReason, Side};

    fn catalog() -> Arc<Catalog> {
        let mut catalog = Catalog::new();
        catalog.insert(
            "math",
            Subject::new(
                "Math",
                vec![
                    Flashcard::new("2 + 2", "4")
                        .with_options(["3", "4", "5"])
                        .with_hint("Simple arithmetic"),
                    Flashcard::new("5 x 3", "15")
                        .with_options(["10", "15", "20"])
                        .with_hint("Multiplication"),
                ],
            ),
        );
        catalog.insert(
            "science",
            Subject::new(
                "Science",
                vec![Flashcard::new("Formula of water", "H2O").with_options(["CO2", "H2O", "O2"])],
            ),
        );
        catalog.insert("empty", Subject::new("Empty", vec![]));
        Arc::new(catalog)
    }

    fn session_in(subject: &str, mode: Mode) -> Session {
        let mut session = Session::new(catalog());
        session.select_subject(subject).unwrap();
        session.change_mode(mode).unwrap();
        session
    }

    fn board_position(session: &Session, side: Side, card_index: usize) -> usize {
        session
            .board()
            .items()
            .iter()
            .position(|i| i.side == side && i.card_index == card_index)
            .unwrap()
    }

    #[test]
    fn starts_without_subject() {
        let session = Session::new(catalog());
        assert_eq!(session.active_subject(), None);
        assert_eq!(session.mode(), Mode::Flashcards);
        assert!(session.current_flashcard().is_none());
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn select_subject_resets_everything() {
        let mut session = session_in("math", Mode::Test);
        session.answer("4").unwrap();
        session.advance().unwrap();

        session.select_subject("science").unwrap();
        assert_eq!(session.mode(), Mode::Flashcards);
        assert_eq!(session.card_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.known().is_empty());
        assert!(!session.is_result_shown());
        assert_eq!(session.current_flashcard().unwrap().answer, "H2O");
    }

    #[test]
    fn select_unknown_subject_is_error() {
        let mut session = Session::new(catalog());
        assert_eq!(
            session.select_subject("history"),
            Err(SessionError::UnknownSubject("history".into()))
        );
        assert_eq!(session.active_subject(), None);
    }

    #[test]
    fn change_mode_resets_index_and_score() {
        for mode in Mode::ALL {
            let mut session = session_in("math", Mode::Test);
            session.answer("4").unwrap();
            session.advance().unwrap();
            assert_eq!((session.card_index(), session.score()), (1, 1));

            session.change_mode(mode).unwrap();
            assert_eq!(session.mode(), mode);
            assert_eq!(session.card_index(), 0);
            assert_eq!(session.score(), 0);
            assert!(session.known().is_empty() && session.unknown().is_empty());
        }
    }

    #[test]
    fn change_mode_without_subject_is_error() {
        let mut session = Session::new(catalog());
        assert_eq!(
            session.change_mode(Mode::Test),
            Err(SessionError::NoActiveSubject)
        );
    }

    #[test]
    fn test_mode_scenario_reports_final_score() {
        let mut session = session_in("math", Mode::Test);

        assert_eq!(session.answer("4").unwrap(), AnswerOutcome::Correct);
        assert_eq!(session.score(), 1);
        assert_eq!(
            session.advance().unwrap(),
            Advance::Moved { card_index: 1 }
        );
        assert!(session.selected_option().is_none());

        assert_eq!(
            session.answer("20").unwrap(),
            AnswerOutcome::Incorrect {
                expected: "15".into()
            }
        );
        assert_eq!(session.score(), 1);

        let Advance::Finished(final_score) = session.advance().unwrap() else {
            panic!("expected the test to finish");
        };
        assert_eq!(final_score.to_string(), "1/2");
        assert_eq!(session.card_index(), 1);
    }

    #[test]
    fn answering_twice_is_noop() {
        let mut session = session_in("math", Mode::Test);
        session.answer("3").unwrap();
        assert_eq!(session.answer("4").unwrap(), AnswerOutcome::AlreadyAnswered);
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected_option(), Some("3"));
        assert_eq!(session.answered(), 1);
    }

    #[test]
    fn answer_tracks_known_and_unknown() {
        let mut session = session_in("math", Mode::Test);
        session.answer("4").unwrap();
        session.advance().unwrap();
        session.answer("10").unwrap();
        assert_eq!(session.known().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(session.unknown().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn answer_outside_test_mode_is_error() {
        let mut session = session_in("math", Mode::Learn);
        assert!(matches!(
            session.answer("4"),
            Err(SessionError::ModeMismatch {
                expected: Mode::Test,
                actual: Mode::Learn,
                ..
            })
        ));
    }

    #[test]
    fn score_only_counts_exact_answers() {
        let mut session = session_in("math", Mode::Test);
        for option in ["3", "4 ", "5"] {
            session.change_mode(Mode::Test).unwrap();
            session.answer(option).unwrap();
            assert_eq!(session.score(), 0, "option {option:?} must not score");
        }
    }

    #[test]
    fn advance_never_leaves_range() {
        let catalog = catalog();
        for (id, subject) in catalog.iter() {
            for mode in Mode::ALL {
                let mut session = Session::new(Arc::clone(&catalog));
                session.select_subject(id).unwrap();
                session.change_mode(mode).unwrap();
                for _ in 0..subject.len() + 3 {
                    session.advance().unwrap();
                    assert!(session.card_index() <= subject.last_index().unwrap_or(0));
                    assert!(session.score() <= session.answered());
                }
            }
        }
    }

    #[test]
    fn advance_at_end_outside_test_is_noop() {
        let mut session = session_in("science", Mode::Learn);
        session.flip().unwrap();
        assert_eq!(session.advance().unwrap(), Advance::AtEnd);
        assert!(session.is_flipped());
    }

    #[test]
    fn advance_clears_per_card_flags() {
        let mut session = session_in("math", Mode::Flashcards);
        assert!(session.flip().unwrap());
        session.advance().unwrap();
        assert!(!session.is_flipped());
    }

    #[test]
    fn mark_known_and_unknown_advance() {
        let mut session = session_in("math", Mode::Flashcards);
        assert_eq!(
            session.mark_known().unwrap(),
            Advance::Moved { card_index: 1 }
        );
        assert_eq!(session.mark_unknown().unwrap(), Advance::AtEnd);
        assert_eq!(session.mark_unknown().unwrap(), Advance::AtEnd);

        assert_eq!(session.known().len(), 1);
        assert!(session.known().contains(&0));
        assert_eq!(session.unknown().len(), 1);
        assert!(session.unknown().contains(&1));
    }

    #[test]
    fn mark_known_requires_flashcards_mode() {
        let mut session = session_in("math", Mode::Test);
        assert!(session.mark_known().is_err());
        assert!(session.known().is_empty());
    }

    #[test]
    fn empty_subject_is_inert() {
        let mut session = session_in("empty", Mode::Test);
        assert!(session.current_flashcard().is_none());
        assert!(matches!(
            session.answer("x"),
            Err(SessionError::EmptySubject(_))
        ));
        assert_eq!(
            session.advance().unwrap(),
            Advance::Finished(FinalScore { score: 0, total: 0 })
        );
        assert_eq!(session.card_index(), 0);
    }

    #[test]
    fn match_pairs_count_only_same_card() {
        let mut session = session_in("math", Mode::Match);
        assert_eq!(session.board().len(), 4);

        let q0 = board_position(&session, Side::Question, 0);
        let a1 = board_position(&session, Side::Answer, 1);
        session.match_attempt(q0).unwrap();
        assert_eq!(
            session.match_attempt(a1).unwrap(),
            MatchSelect::Pending { correct: false }
        );
        assert_eq!(session.resolve_match(), Some(false));
        assert_eq!(session.matched_pair_count(), 0);

        let a0 = board_position(&session, Side::Answer, 0);
        session.match_attempt(a0).unwrap();
        session.match_attempt(q0).unwrap();
        assert_eq!(session.matched_pair_count(), 0, "counted only on resolve");
        assert_eq!(session.resolve_match(), Some(true));
        assert_eq!(session.matched_pair_count(), 1);

        assert_eq!(
            session.match_attempt(q0).unwrap(),
            MatchSelect::Ignored(IgnoreReason::AlreadyMatched)
        );
    }

    #[test]
    fn match_attempt_checks_bounds_and_mode() {
        let mut session = session_in("math", Mode::Match);
        assert_eq!(
            session.match_attempt(4),
            Err(SessionError::UnknownMatchItem(4))
        );
        session.change_mode(Mode::Learn).unwrap();
        assert!(session.match_attempt(0).is_err());
        assert!(session.board().is_empty());
    }

    #[test]
    fn shuffle_match_board_keeps_pairs() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut session = session_in("math", Mode::Match);
        session.shuffle_match_board(&mut StdRng::seed_from_u64(42));
        let q1 = board_position(&session, Side::Question, 1);
        let a1 = board_position(&session, Side::Answer, 1);
        session.match_attempt(q1).unwrap();
        session.match_attempt(a1).unwrap();
        assert_eq!(session.resolve_match(), Some(true));
    }

    #[test]
    fn snapshot_and_restore() {
        let mut session = session_in("math", Mode::Test);
        session.answer("4").unwrap();
        session.advance().unwrap();
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.card_index, 1);
        assert_eq!(snapshot.score, 1);
        assert_eq!(snapshot.mode, Some(Mode::Test));

        let mut restored = Session::new(catalog());
        assert!(restored.restore(&snapshot));
        assert_eq!(restored.active_subject(), Some("math"));
        assert_eq!(restored.mode(), Mode::Test);
        assert_eq!(restored.card_index(), 1);
        assert_eq!(restored.score(), 1);
    }

    #[test]
    fn restore_clamps_index_and_score() {
        let mut session = Session::new(catalog());
        let applied = session.restore(&ProgressSnapshot {
            subject: "math".into(),
            mode: None,
            card_index: 99,
            score: 50,
        });
        assert!(applied);
        assert_eq!(session.mode(), Mode::Flashcards);
        assert_eq!(session.card_index(), 1);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn restore_ignores_unknown_subject() {
        let mut session = Session::new(catalog());
        let applied = session.restore(&ProgressSnapshot {
            subject: "history".into(),
            mode: Some(Mode::Test),
            card_index: 0,
            score: 0,
        });
        assert!(!applied);
        assert_eq!(session.active_subject(), None);
    }

    #[test]
    fn leave_subject_returns_to_selection() {
        let mut session = session_in("math", Mode::Test);
        session.leave_subject();
        assert_eq!(session.active_subject(), None);
        assert_eq!(session.advance(), Err(SessionError::NoActiveSubject));
    }
}
