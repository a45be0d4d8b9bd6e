//! The `flashstudy study` command.
//!
//! A line-oriented loop over a [`StudyController`]: each input line is parsed
//! into a [`Command`] against the current session, applied, and the session
//! is rendered again. Logs go to stderr, the session to stdout.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use flashstudy_core::matching::{IgnoreReason, MatchSelect, Side};
use flashstudy_core::session::{Advance, AnswerOutcome, Session};
use flashstudy_core::traits::{load_or_empty, ProgressStore};
use flashstudy_core::{Mode, SessionError, StudyController};
use flashstudy_store::config::{create_dataset_provider, create_progress_store, load_config_from};
use flashstudy_store::memory::MemoryProgressStore;

const HELP: &str = "\
Commands:
  <number> | <id>   pick a subject (on the subject list)
  f, flip           show or hide the answer (flashcards, learn)
  k, known          mark the card as known and move on (flashcards)
  u, unknown        mark the card as unknown and move on (flashcards)
  <number>          choose an option (test) or a tile (match)
  n, next           next card
  s, shuffle        deal a new match board (match)
  mode <name>       switch to flashcards, learn, test or match
  b, back           back to the subject list
  q, quit           leave";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Empty,
    Quit,
    Help,
    Back,
    Select(String),
    Mode(Mode),
    Flip,
    Known,
    Unknown,
    Next,
    Answer(String),
    Pick(usize),
    Shuffle,
}

pub async fn execute(
    config_path: Option<PathBuf>,
    subject: Option<String>,
    mode: Option<Mode>,
    ephemeral: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = create_dataset_provider(&config.dataset)?;
    let catalog = Arc::new(load_or_empty(provider.as_ref()).await);

    let store: Arc<dyn ProgressStore> = if ephemeral {
        Arc::new(MemoryProgressStore::new())
    } else {
        create_progress_store(&config)?
    };
    tracing::debug!(store = store.name(), "progress store ready");

    let mut ctl = StudyController::new(Session::new(catalog), store, config.controller_config());
    ctl.restore().await;

    if let Some(id) = &subject {
        ctl.select_subject(id)?;
    }
    if let Some(mode) = mode {
        ctl.change_mode(mode)?;
    }
    ctl.shuffle_match_board(&mut rand::thread_rng());

    println!("{}", render(ctl.session()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line, ctl.session()) {
            Ok(Command::Empty) => continue,
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(message) => {
                println!("{message} (type h for help)");
                continue;
            }
        };

        match apply(&mut ctl, command).await {
            Ok(Some(message)) => println!("{message}"),
            Ok(None) => {}
            Err(e) => {
                println!("! {e}");
                continue;
            }
        }
        println!("{}", render(ctl.session()));
    }

    ctl.flush().await;
    println!("Bye.");
    Ok(())
}

fn parse_command(line: &str, session: &Session) -> Result<Command, String> {
    let input = line.trim();
    let lower = input.to_lowercase();

    match lower.as_str() {
        "" => return Ok(Command::Empty),
        "q" | "quit" | "exit" => return Ok(Command::Quit),
        "h" | "help" | "?" => return Ok(Command::Help),
        _ => {}
    }

    let Some(subject_id) = session.active_subject() else {
        return parse_subject_choice(input, session);
    };

    if let Some(rest) = lower
        .strip_prefix("mode ")
        .or_else(|| lower.strip_prefix("m "))
    {
        return rest.parse().map(Command::Mode);
    }

    match lower.as_str() {
        "b" | "back" => return Ok(Command::Back),
        "n" | "next" => return Ok(Command::Next),
        _ => {}
    }

    match session.mode() {
        Mode::Flashcards | Mode::Learn => match lower.as_str() {
            "f" | "flip" => Ok(Command::Flip),
            "k" | "known" if session.mode() == Mode::Flashcards => Ok(Command::Known),
            "u" | "unknown" if session.mode() == Mode::Flashcards => Ok(Command::Unknown),
            _ => Err(format!("unrecognised input: {input}")),
        },
        Mode::Test => {
            let options = session
                .current_flashcard()
                .map(|card| card.options.as_slice())
                .unwrap_or_default();
            match input.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => Ok(Command::Answer(options[n - 1].clone())),
                Ok(_) if !options.is_empty() => {
                    Err(format!("choose an option between 1 and {}", options.len()))
                }
                _ if session.current_flashcard().is_none() => {
                    Err(format!("subject '{subject_id}' has no flashcards"))
                }
                _ => Ok(Command::Answer(input.to_string())),
            }
        }
        Mode::Match => match lower.as_str() {
            "s" | "shuffle" => Ok(Command::Shuffle),
            _ => match input.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Command::Pick(n - 1)),
                _ => Err(format!("unrecognised input: {input}")),
            },
        },
    }
}

fn parse_subject_choice(input: &str, session: &Session) -> Result<Command, String> {
    let catalog = session.catalog();
    if let Ok(n) = input.parse::<usize>() {
        return catalog
            .ids()
            .nth(n.wrapping_sub(1))
            .map(|id| Command::Select(id.to_string()))
            .ok_or_else(|| format!("no subject number {n}"));
    }
    if catalog.contains(input) {
        Ok(Command::Select(input.to_string()))
    } else {
        Err(format!("unknown subject: {input}"))
    }
}

/// Apply a command, returning an optional message to show before the
/// session is rendered again.
async fn apply(ctl: &mut StudyController, command: Command) -> Result<Option<String>, SessionError> {
    let message = match command {
        Command::Empty | Command::Quit => None,
        Command::Help => Some(HELP.to_string()),
        Command::Back => {
            ctl.leave_subject();
            None
        }
        Command::Select(id) => {
            ctl.select_subject(&id)?;
            None
        }
        Command::Mode(mode) => {
            ctl.change_mode(mode)?;
            ctl.shuffle_match_board(&mut rand::thread_rng());
            None
        }
        Command::Flip => {
            ctl.flip()?;
            None
        }
        Command::Known => describe_advance(ctl.mark_known()?),
        Command::Unknown => describe_advance(ctl.mark_unknown()?),
        Command::Next => describe_advance(ctl.advance()?),
        Command::Answer(option) => Some(match ctl.answer(&option)? {
            AnswerOutcome::Correct => "Correct!".to_string(),
            AnswerOutcome::Incorrect { expected } => {
                format!("Incorrect. The answer is {expected}.")
            }
            AnswerOutcome::AlreadyAnswered => {
                "Already answered; type n for the next card.".to_string()
            }
        }),
        Command::Pick(position) => match ctl.match_attempt(position).await? {
            MatchSelect::Selected => None,
            MatchSelect::Ignored(reason) => Some(
                match reason {
                    IgnoreReason::EvaluationPending => "Wait for the current pair.",
                    IgnoreReason::AlreadyMatched => "That tile is already matched.",
                    IgnoreReason::AlreadySelected => "That tile is already selected.",
                }
                .to_string(),
            ),
            MatchSelect::Pending { correct: true } if ctl.session().board().is_complete() => {
                Some("Match! All pairs found.".to_string())
            }
            MatchSelect::Pending { correct: true } => Some("Match!".to_string()),
            MatchSelect::Pending { correct: false } => Some("No match.".to_string()),
        },
        Command::Shuffle => {
            ctl.shuffle_match_board(&mut rand::thread_rng());
            None
        }
    };
    Ok(message)
}

fn describe_advance(advance: Advance) -> Option<String> {
    match advance {
        Advance::Moved { .. } => None,
        Advance::Finished(score) => Some(format!("Test complete! Final score: {score}")),
        Advance::AtEnd => Some("That was the last card.".to_string()),
    }
}

/// Render the session as plain text.
fn render(session: &Session) -> String {
    let mut out = String::new();

    let Some(subject) = session.subject() else {
        let catalog = session.catalog();
        if catalog.is_empty() {
            out.push_str("No subjects available. Type q to quit.");
            return out;
        }
        out.push_str("Subjects:\n");
        for (n, (id, subject)) in catalog.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} [{id}] ({} cards)", n + 1, subject.name, subject.len());
        }
        out.push_str("Pick a subject by number or id, q to quit.");
        return out;
    };

    let _ = write!(out, "== {} | {} ==", subject.name, session.mode());

    let Some(card) = session.current_flashcard() else {
        out.push_str("\nThis subject has no flashcards. Type back to choose another.");
        return out;
    };

    if session.mode() != Mode::Match {
        let _ = write!(
            out,
            "  card {}/{}\nQ: {}",
            session.card_index() + 1,
            session.total_cards(),
            card.question
        );
    }

    match session.mode() {
        Mode::Flashcards | Mode::Learn => {
            if session.is_flipped() {
                let _ = write!(out, "\nA: {}", card.answer);
            } else if !card.hint.is_empty() {
                let _ = write!(out, "\n(hint: {})", card.hint);
            }
            if session.mode() == Mode::Flashcards {
                let _ = write!(
                    out,
                    "\nKnown: {}  Unknown: {}\n[f]lip  [k]nown  [u]nknown  [n]ext",
                    session.known().len(),
                    session.unknown().len()
                );
            } else {
                out.push_str("\n[f]lip  [n]ext");
            }
        }
        Mode::Test => {
            for (n, option) in card.options.iter().enumerate() {
                let marker = if session.selected_option() == Some(option.as_str()) {
                    '>'
                } else {
                    ' '
                };
                let _ = write!(out, "\n {marker}{}. {option}", n + 1);
            }
            let _ = write!(
                out,
                "\nScore: {}/{}",
                session.score(),
                session.answered()
            );
            if session.is_result_shown() && session.is_last_card() {
                out.push_str("\n[n] finish test");
            } else if session.is_result_shown() {
                out.push_str("\n[n]ext");
            } else if card.options.is_empty() {
                out.push_str("\nType your answer");
            } else {
                out.push_str("\nChoose an option by number");
            }
        }
        Mode::Match => {
            let board = session.board();
            for (position, item) in board.items().iter().enumerate() {
                let state = if board.is_matched(position) {
                    'x'
                } else if board.is_selected(position) {
                    '*'
                } else {
                    ' '
                };
                let side = match item.side {
                    Side::Question => 'Q',
                    Side::Answer => 'A',
                };
                let _ = write!(out, "\n [{state}] {:>2}. {side}: {}", position + 1, item.text);
            }
            let _ = write!(
                out,
                "\nPairs: {}/{}\nPick two tiles by number, [s]huffle",
                session.matched_pair_count(),
                board.pair_count()
            );
        }
    }

    out
}
