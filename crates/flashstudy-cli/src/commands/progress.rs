//! The `flashstudy progress` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use flashstudy_store::config::{create_progress_store, load_config_from, ProgressConfig};
use flashstudy_store::local::{FileKeyValueStore, LocalProgressStore};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_progress_store(&config)?;

    let Some(snapshot) = store.load().await? else {
        println!("No saved progress ({} store).", store.name());
        return Ok(());
    };

    println!("Store:   {}", store.name());
    println!("Subject: {}", snapshot.subject);
    if let Some(mode) = snapshot.mode {
        println!("Mode:    {mode}");
    }
    println!("Card:    {}", snapshot.card_index + 1);
    if snapshot.score > 0 {
        println!("Score:   {}", snapshot.score);
    }

    if let ProgressConfig::Local { .. } = config.progress {
        let kv = FileKeyValueStore::open(config.local_progress_path())?;
        if let Some(saved_at) = LocalProgressStore::new(Arc::new(kv)).saved_at()? {
            println!("Saved:   {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    Ok(())
}
