//! Core trait definitions for dataset providers and progress stores.
//!
//! These async traits are implemented by the `flashstudy-store` crate.

use async_trait::async_trait;

use crate::model::{Catalog, ProgressSnapshot};

// ---------------------------------------------------------------------------
// Dataset provider trait
// ---------------------------------------------------------------------------

/// Source of study content.
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// Human-readable provider name (e.g. "http").
    fn name(&self) -> &str;

    /// Load the full catalog of subjects.
    async fn load(&self) -> anyhow::Result<Catalog>;
}

// ---------------------------------------------------------------------------
// Progress store trait
// ---------------------------------------------------------------------------

/// Persistence backend for session progress.
///
/// Writes are fire-and-forget from the session's point of view: callers log
/// failures and carry on.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Human-readable store name (e.g. "local").
    fn name(&self) -> &str;

    /// Load the last saved snapshot, if any.
    async fn load(&self) -> anyhow::Result<Option<ProgressSnapshot>>;

    /// Persist a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &ProgressSnapshot) -> anyhow::Result<()>;

    /// Forget saved progress.
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Load a catalog, falling back to an empty one on failure.
///
/// The application stays usable without data, so load errors are logged
/// rather than propagated.
pub async fn load_or_empty(provider: &dyn DatasetProvider) -> Catalog {
    match provider.load().await {
        Ok(catalog) => {
            tracing::info!(
                provider = provider.name(),
                subjects = catalog.len(),
                "dataset loaded"
            );
            catalog
        }
        Err(e) => {
            tracing::error!(provider = provider.name(), "failed to load dataset: {e:#}");
            Catalog::new()
        }
    }
}
