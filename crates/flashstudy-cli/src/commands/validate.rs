//! The `flashstudy validate` command.

use std::path::PathBuf;

use anyhow::Result;

use flashstudy_core::parser::{self, validate_catalog};
use flashstudy_store::config::{create_dataset_provider, load_config_from};

pub async fn execute(dataset_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let catalog = match dataset_path {
        Some(path) => parser::load_dataset(&path)?,
        None => {
            let config = load_config_from(config_path.as_deref())?;
            create_dataset_provider(&config.dataset)?.load().await?
        }
    };

    let warnings = validate_catalog(&catalog);

    for (id, subject) in catalog.iter() {
        println!("Subject: {} [{id}] ({} cards)", subject.name, subject.len());

        for w in warnings.iter().filter(|w| w.subject_id == id) {
            let prefix = w
                .card_index
                .map(|i| format!("  [card {}]", i + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
    }

    if catalog.is_empty() {
        println!("Dataset contains no subjects.");
    } else if warnings.is_empty() {
        println!("All subjects valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
