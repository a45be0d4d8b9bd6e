//! Match-mode board.
//!
//! The board lays out every question and every answer of a subject as
//! separate items. The player selects two items; a question and an answer
//! from the same flashcard form a pair. Evaluation is two-phase: [`select`]
//! reports a pending verdict once two items are selected, and [`resolve`]
//! applies it after the display delay.
//!
//! [`select`]: MatchBoard::select
//! [`resolve`]: MatchBoard::resolve

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::Flashcard;

/// Which face of a flashcard a board item shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Question,
    Answer,
}

/// One selectable tile on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchItem {
    /// Index of the flashcard the text comes from.
    pub card_index: usize,
    pub side: Side,
    pub text: String,
}

/// Result of selecting a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSelect {
    /// The selection was not accepted.
    Ignored(IgnoreReason),
    /// First item of a pair is selected.
    Selected,
    /// Two items are selected; resolve after the display delay.
    Pending { correct: bool },
}

/// Why a selection was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Two items are already awaiting evaluation.
    EvaluationPending,
    /// The item is part of an already-matched pair.
    AlreadyMatched,
    /// The item is already the first selection.
    AlreadySelected,
}

/// Board state for one match game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchBoard {
    items: Vec<MatchItem>,
    selected: Vec<usize>,
    matched: BTreeSet<usize>,
}

impl MatchBoard {
    /// Lay out all questions followed by all answers.
    pub fn new(flashcards: &[Flashcard]) -> Self {
        let questions = flashcards.iter().enumerate().map(|(i, c)| MatchItem {
            card_index: i,
            side: Side::Question,
            text: c.question.clone(),
        });
        let answers = flashcards.iter().enumerate().map(|(i, c)| MatchItem {
            card_index: i,
            side: Side::Answer,
            text: c.answer.clone(),
        });

        Self {
            items: questions.chain(answers).collect(),
            selected: Vec::new(),
            matched: BTreeSet::new(),
        }
    }

    /// Lay out the board in random order.
    pub fn shuffled<R: Rng + ?Sized>(flashcards: &[Flashcard], rng: &mut R) -> Self {
        let mut board = Self::new(flashcards);
        board.items.shuffle(rng);
        board
    }

    pub fn items(&self) -> &[MatchItem] {
        &self.items
    }

    pub fn item(&self, position: usize) -> Option<&MatchItem> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Positions currently selected, in selection order.
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn is_selected(&self, position: usize) -> bool {
        self.selected.contains(&position)
    }

    pub fn is_matched(&self, position: usize) -> bool {
        self.matched.contains(&position)
    }

    /// Whether two items are awaiting evaluation.
    pub fn is_pending(&self) -> bool {
        self.selected.len() == 2
    }

    /// Number of pairs on the board.
    pub fn pair_count(&self) -> usize {
        self.items.len() / 2
    }

    /// Every item has been matched.
    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.matched.len() == self.items.len()
    }

    /// Select the item at `position`. The caller checks bounds.
    pub(crate) fn select(&mut self, position: usize) -> MatchSelect {
        if self.is_pending() {
            return MatchSelect::Ignored(IgnoreReason::EvaluationPending);
        }
        if self.matched.contains(&position) {
            return MatchSelect::Ignored(IgnoreReason::AlreadyMatched);
        }
        if self.selected.contains(&position) {
            return MatchSelect::Ignored(IgnoreReason::AlreadySelected);
        }

        self.selected.push(position);
        if self.selected.len() < 2 {
            return MatchSelect::Selected;
        }

        MatchSelect::Pending {
            correct: self.pending_is_pair(),
        }
    }

    /// Apply the pending verdict and clear the selection.
    ///
    /// Returns `None` when nothing is pending, otherwise whether a pair was
    /// matched.
    pub(crate) fn resolve(&mut self) -> Option<bool> {
        if !self.is_pending() {
            return None;
        }
        let correct = self.pending_is_pair();
        if correct {
            self.matched.extend(self.selected.iter().copied());
        }
        self.selected.clear();
        Some(correct)
    }

    fn pending_is_pair(&self) -> bool {
        let &[first, second] = self.selected.as_slice() else {
            return false;
        };
        match (self.items.get(first), self.items.get(second)) {
            (Some(a), Some(b)) => a.card_index == b.card_index && a.side != b.side,
            _ => false,
        }
    }
}
