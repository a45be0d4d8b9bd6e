//! flashstudy-store: dataset providers and progress stores.
//!
//! Implements the `DatasetProvider` and `ProgressStore` traits from
//! `flashstudy-core` over the bundled sample data, local files, HTTP
//! endpoints, and memory, plus the configuration that picks between them.

pub mod builtin;
pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod local;
pub mod memory;

pub use config::{
    create_dataset_provider, create_progress_store, load_config, load_config_from, DatasetConfig,
    FlashstudyConfig, ProgressConfig,
};
pub use error::StoreError;
pub use local::{FileKeyValueStore, KeyValueStore, LocalProgressStore};
pub use memory::{MemoryKeyValueStore, MemoryProgressStore};
