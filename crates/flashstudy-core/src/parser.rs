//! Dataset parser.
//!
//! Loads a [`Catalog`] from JSON or TOML files and directories, and validates
//! it with presence checks.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Catalog, Flashcard, Subject};

/// Intermediate TOML structure for dataset files.
///
/// ```toml
/// [subjects.math]
/// name = "Math"
///
/// [[subjects.math.flashcards]]
/// question = "2 + 2"
/// answer = "4"
/// options = ["3", "4", "5"]
/// ```
#[derive(Debug, Deserialize)]
struct TomlDatasetFile {
    #[serde(default)]
    subjects: BTreeMap<String, TomlSubject>,
}

#[derive(Debug, Deserialize)]
struct TomlSubject {
    name: String,
    #[serde(default)]
    flashcards: Vec<TomlFlashcard>,
}

#[derive(Debug, Deserialize)]
struct TomlFlashcard {
    question: String,
    answer: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    hint: String,
}

/// On-disk dataset encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Toml,
}

impl DatasetFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(DatasetFormat::Json),
            "toml" => Some(DatasetFormat::Toml),
            _ => None,
        }
    }
}

/// Parse a single dataset file into a `Catalog`.
pub fn parse_dataset(path: &Path) -> Result<Catalog> {
    let format = DatasetFormat::from_path(path).with_context(|| {
        format!(
            "unsupported dataset file (expected .json or .toml): {}",
            path.display()
        )
    })?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset file: {}", path.display()))?;

    parse_dataset_str(&content, format, path)
}

/// Parse dataset text into a `Catalog` (useful for testing).
pub fn parse_dataset_str(content: &str, format: DatasetFormat, source_path: &Path) -> Result<Catalog> {
    let catalog = match format {
        DatasetFormat::Json => serde_json::from_str::<Catalog>(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
        DatasetFormat::Toml => {
            let parsed: TomlDatasetFile = toml::from_str(content)
                .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
            parsed
                .subjects
                .into_iter()
                .map(|(id, s)| {
                    let flashcards = s
                        .flashcards
                        .into_iter()
                        .map(|c| Flashcard {
                            question: c.question,
                            answer: c.answer,
                            options: c.options,
                            hint: c.hint,
                        })
                        .collect();
                    (id, Subject::new(s.name, flashcards))
                })
                .collect()
        }
    };

    Ok(normalize(catalog))
}

/// Parse a JSON `SubjectsMap` body, e.g. an HTTP response.
pub fn parse_dataset_json(content: &str) -> Result<Catalog> {
    let catalog: Catalog = serde_json::from_str(content).context("failed to parse dataset JSON")?;
    Ok(normalize(catalog))
}

/// Drop duplicate options, keeping the first occurrence.
pub fn normalize(catalog: Catalog) -> Catalog {
    catalog
        .iter()
        .map(|(id, subject)| {
            let flashcards = subject
                .flashcards
                .iter()
                .map(|card| {
                    let mut options: Vec<String> = Vec::with_capacity(card.options.len());
                    for option in &card.options {
                        if !options.contains(option) {
                            options.push(option.clone());
                        }
                    }
                    Flashcard {
                        options,
                        ..card.clone()
                    }
                })
                .collect();
            (id.to_string(), Subject::new(subject.name.clone(), flashcards))
        })
        .collect()
}

/// Recursively load all `.json` and `.toml` dataset files from a directory.
///
/// Files are visited in path order; a subject id defined twice keeps the
/// last definition. Unparseable files are skipped with a warning.
pub fn load_dataset_directory(dir: &Path) -> Result<Catalog> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut catalog = Catalog::new();
    for path in paths {
        if path.is_dir() {
            catalog.extend(load_dataset_directory(&path)?);
        } else if DatasetFormat::from_path(&path).is_some() {
            match parse_dataset(&path) {
                Ok(parsed) => catalog.extend(parsed),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalog)
}

/// Load a dataset from a file or a directory.
pub fn load_dataset(path: &Path) -> Result<Catalog> {
    if path.is_dir() {
        load_dataset_directory(path)
    } else {
        parse_dataset(path)
    }
}

/// A warning from dataset validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The subject id.
    pub subject_id: String,
    /// The card index (if applicable).
    pub card_index: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Validate a catalog with presence checks.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (id, subject) in catalog.iter() {
        let subject_warning = |message: &str| ValidationWarning {
            subject_id: id.to_string(),
            card_index: None,
            message: message.to_string(),
        };

        if subject.name.trim().is_empty() {
            warnings.push(subject_warning("subject name is empty"));
        }
        if subject.is_empty() {
            warnings.push(subject_warning("subject has no flashcards"));
        }

        for (index, card) in subject.flashcards.iter().enumerate() {
            let mut card_warning = |message: String| {
                warnings.push(ValidationWarning {
                    subject_id: id.to_string(),
                    card_index: Some(index),
                    message,
                })
            };

            if card.question.trim().is_empty() {
                card_warning("question is empty".into());
            }
            if card.answer.trim().is_empty() {
                card_warning("answer is empty".into());
            }
            if !card.options.is_empty() && !card.options.contains(&card.answer) {
                card_warning(format!(
                    "answer '{}' is not among the options; test mode cannot score this card",
                    card.answer
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_JSON: &str = r#"{
        "math": {
            "name": "Math",
            "flashcards": [
                {"question": "2 + 2", "answer": "4", "options": ["3", "4", "5"], "hint": "Simple arithmetic"},
                {"question": "5 x 3", "answer": "15", "options": ["10", "15", "20"], "hint": "Multiplication"}
            ]
        }
    }"#;

    const VALID_TOML: &str = r#"
[subjects.science]
name = "Science"

[[subjects.science.flashcards]]
question = "Formula of water"
answer = "H2O"
options = ["CO2", "H2O", "O2"]
hint = "Chemistry"
"#;

    #[test]
    fn parse_valid_json() {
        let catalog =
            parse_dataset_str(VALID_JSON, DatasetFormat::Json, &PathBuf::from("d.json")).unwrap();
        let math = catalog.get("math").unwrap();
        assert_eq!(math.name, "Math");
        assert_eq!(math.len(), 2);
        assert_eq!(math.flashcards[1].answer, "15");
    }

    #[test]
    fn parse_valid_toml() {
        let catalog =
            parse_dataset_str(VALID_TOML, DatasetFormat::Toml, &PathBuf::from("d.toml")).unwrap();
        let science = catalog.get("science").unwrap();
        assert_eq!(science.flashcards[0].question, "Formula of water");
        assert_eq!(science.flashcards[0].hint, "Chemistry");
    }

    #[test]
    fn parse_missing_optional_fields() {
        let json = r#"{"x": {"name": "X", "flashcards": [{"question": "q", "answer": "a"}]}}"#;
        let catalog = parse_dataset_json(json).unwrap();
        let card = &catalog.get("x").unwrap().flashcards[0];
        assert!(card.options.is_empty());
        assert!(card.hint.is_empty());
    }

    #[test]
    fn duplicate_options_are_dropped() {
        let json = r#"{"x": {"name": "X", "flashcards": [
            {"question": "q", "answer": "a", "options": ["b", "a", "b", "c", "a"]}
        ]}}"#;
        let catalog = parse_dataset_json(json).unwrap();
        assert_eq!(
            catalog.get("x").unwrap().flashcards[0].options,
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn parse_malformed_input() {
        let bad = "this is not [valid toml }{";
        assert!(parse_dataset_str(bad, DatasetFormat::Toml, &PathBuf::from("bad.toml")).is_err());
        assert!(parse_dataset_json("{\"math\": 3}").is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_dataset(&PathBuf::from("cards.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported dataset file"));
    }

    #[test]
    fn validate_reports_presence_problems() {
        let json = r#"{
            "blank": {"name": " "},
            "broken": {"name": "Broken", "flashcards": [
                {"question": "", "answer": "x", "options": ["y", "z"]}
            ]}
        }"#;
        let catalog = parse_dataset_json(json).unwrap();
        let warnings = validate_catalog(&catalog);

        assert!(warnings
            .iter()
            .any(|w| w.subject_id == "blank" && w.message.contains("name is empty")));
        assert!(warnings
            .iter()
            .any(|w| w.subject_id == "blank" && w.message.contains("no flashcards")));
        assert!(warnings
            .iter()
            .any(|w| w.card_index == Some(0) && w.message.contains("question is empty")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("not among the options")));
    }

    #[test]
    fn validate_clean_catalog() {
        let catalog = parse_dataset_json(VALID_JSON).unwrap();
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn load_directory_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_JSON).unwrap();
        std::fs::write(dir.path().join("b.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("c.json"), "{ not json").unwrap();

        let catalog = load_dataset_directory(dir.path()).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["math", "science"]);
    }

    #[test]
    fn later_files_override_subject_ids() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_JSON).unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"math": {"name": "Math II", "flashcards": []}}"#,
        )
        .unwrap();

        let catalog = load_dataset(dir.path()).unwrap();
        assert_eq!(catalog.get("math").unwrap().name, "Math II");
    }
}
