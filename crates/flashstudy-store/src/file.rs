//! File-backed dataset provider.

use std::path::PathBuf;

use async_trait::async_trait;

use flashstudy_core::model::Catalog;
use flashstudy_core::parser;
use flashstudy_core::traits::DatasetProvider;

/// Loads a catalog from a `.json`/`.toml` file or a directory of them.
pub struct FileDataset {
    path: PathBuf,
}

impl FileDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetProvider for FileDataset {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> anyhow::Result<Catalog> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || parser::load_dataset(&path)).await?
    }
}
