//! The `flashstudy reset` command.

use std::path::PathBuf;

use anyhow::Result;

use flashstudy_store::config::{create_progress_store, load_config_from};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_progress_store(&config)?;
    store.clear().await?;
    println!("Progress cleared ({} store).", store.name());
    Ok(())
}
