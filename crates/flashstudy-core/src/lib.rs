//! flashstudy-core: Session state machine, data model, and storage traits.
//!
//! This crate defines the study-content model, the pure session state
//! machine, and the controller that mirrors session progress to an injected
//! store. The `flashstudy-store` and `flashstudy-cli` crates build on it.

pub mod controller;
pub mod error;
pub mod matching;
pub mod model;
pub mod parser;
pub mod session;
pub mod traits;

pub use controller::{ControllerConfig, StudyController};
pub use error::SessionError;
pub use model::{Catalog, Flashcard, Mode, ProgressSnapshot, Subject};
pub use session::{Advance, AnswerOutcome, FinalScore, Session};
