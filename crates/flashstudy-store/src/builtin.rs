//! Built-in sample dataset.

use async_trait::async_trait;

use flashstudy_core::model::{Catalog, Flashcard, Subject};
use flashstudy_core::traits::DatasetProvider;

/// A fixed in-memory catalog.
pub struct StaticDataset {
    catalog: Catalog,
}

impl StaticDataset {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// The sample catalog shipped with the binary: `math` (two cards) and
    /// `science` (one card).
    pub fn sample() -> Self {
        Self::new(sample_catalog())
    }
}

#[async_trait]
impl DatasetProvider for StaticDataset {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn load(&self) -> anyhow::Result<Catalog> {
        Ok(self.catalog.clone())
    }
}

pub fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.insert(
        "math",
        Subject::new(
            "Mathematics",
            vec![
                Flashcard::new("2 + 2", "4")
                    .with_options(["3", "4", "5"])
                    .with_hint("Simple arithmetic"),
                Flashcard::new("5 × 3", "15")
                    .with_options(["10", "15", "20"])
                    .with_hint("Multiplication"),
            ],
        ),
    );
    catalog.insert(
        "science",
        Subject::new(
            "Science",
            vec![Flashcard::new("Formula of water", "H₂O")
                .with_options(["CO₂", "H₂O", "O₂"])
                .with_hint("Chemistry")],
        ),
    );
    catalog
}
