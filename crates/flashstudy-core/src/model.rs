//! Core data model types for flashstudy.
//!
//! These are the immutable study-content types (flashcards, subjects, the
//! catalog of subjects) plus the study [`Mode`] and the persisted
//! [`ProgressSnapshot`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single question/answer unit of study content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Front side of the card.
    pub question: String,
    /// Back side of the card; the correct option in test mode.
    pub answer: String,
    /// Multiple-choice options offered in test mode.
    #[serde(default)]
    pub options: Vec<String>,
    /// Hint shown on the front side before flipping.
    #[serde(default)]
    pub hint: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            options: Vec::new(),
            hint: String::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Whether `option` is the correct answer for this card.
    pub fn is_correct(&self, option: &str) -> bool {
        option == self.answer
    }
}

/// A named collection of flashcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Human-readable name.
    pub name: String,
    /// The cards, in study order.
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl Subject {
    pub fn new(name: impl Into<String>, flashcards: Vec<Flashcard>) -> Self {
        Self {
            name: name.into(),
            flashcards,
        }
    }

    pub fn len(&self) -> usize {
        self.flashcards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flashcards.is_empty()
    }

    /// Index of the last card, or `None` for an empty subject.
    pub fn last_index(&self) -> Option<usize> {
        self.flashcards.len().checked_sub(1)
    }
}

/// Mapping of subject id to subject. Immutable once loaded.
///
/// Serializes transparently as a JSON object, so a catalog is wire-compatible
/// with the `{ "<id>": { "name": ..., "flashcards": [...] } }` dataset shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    subjects: BTreeMap<String, Subject>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subjects.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, subject: Subject) -> Option<Subject> {
        self.subjects.insert(id.into(), subject)
    }

    /// Subjects ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Subject)> {
        self.subjects.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Merge `other` into this catalog; ids in `other` win.
    pub fn extend(&mut self, other: Catalog) {
        self.subjects.extend(other.subjects);
    }
}

impl FromIterator<(String, Subject)> for Catalog {
    fn from_iter<T: IntoIterator<Item = (String, Subject)>>(iter: T) -> Self {
        Self {
            subjects: iter.into_iter().collect(),
        }
    }
}

/// Interaction pattern over the active subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Flip cards and self-grade as known / unknown.
    #[default]
    Flashcards,
    /// Sequential review: reveal the answer, move on.
    Learn,
    /// Multiple choice with a running score.
    Test,
    /// Pair questions with their answers.
    Match,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Flashcards, Mode::Learn, Mode::Test, Mode::Match];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Flashcards => "flashcards",
            Mode::Learn => "learn",
            Mode::Test => "test",
            Mode::Match => "match",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flashcards" | "cards" => Ok(Mode::Flashcards),
            "learn" => Ok(Mode::Learn),
            "test" | "quiz" => Ok(Mode::Test),
            "match" => Ok(Mode::Match),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// The persisted subset of a session.
///
/// This is also the body exchanged with a remote progress endpoint, hence the
/// camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Active subject id.
    pub subject: String,
    /// Active mode, when the backend records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Current card index.
    #[serde(default)]
    pub card_index: usize,
    /// Correct answers so far.
    #[serde(default)]
    pub score: u32,
}
