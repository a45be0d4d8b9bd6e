//! The `flashstudy subjects` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use flashstudy_core::traits::load_or_empty;
use flashstudy_store::config::{create_dataset_provider, load_config_from};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = create_dataset_provider(&config.dataset)?;
    let catalog = load_or_empty(provider.as_ref()).await;

    if catalog.is_empty() {
        println!("No subjects available ({} dataset).", provider.name());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Cards"]);
    for (id, subject) in catalog.iter() {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(&subject.name),
            Cell::new(subject.len()),
        ]);
    }
    println!("{table}");

    Ok(())
}
