//! Local key-value persistence.
//!
//! Progress is kept under a handful of string keys, the way a browser's
//! local storage would hold them:
//!
//! | key                | value                      |
//! |--------------------|----------------------------|
//! | `currentSubject`   | subject id                 |
//! | `currentMode`      | `flashcards`, `learn`, ... |
//! | `currentCardIndex` | decimal index              |
//! | `savedAt`          | RFC 3339 timestamp         |
//! | `userId`           | id used by the remote store |

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use flashstudy_core::model::{Mode, ProgressSnapshot};
use flashstudy_core::traits::ProgressStore;

pub const KEY_SUBJECT: &str = "currentSubject";
pub const KEY_MODE: &str = "currentMode";
pub const KEY_CARD_INDEX: &str = "currentCardIndex";
pub const KEY_SAVED_AT: &str = "savedAt";
pub const KEY_USER_ID: &str = "userId";

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Set several keys at once.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed key-value store
// ---------------------------------------------------------------------------

/// Key-value pairs stored as one JSON object in a file.
///
/// The whole object is rewritten on every change through a temporary file
/// in the same directory followed by a rename.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("ignoring corrupt state file {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read state file: {}", path.display()))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` to a copy of the map, write it, and only then make it
    /// visible. A failed write leaves the store as it was.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self.lock();
        let mut updated = entries.clone();
        change(&mut updated);
        self.write(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create state directory: {}", dir.display()))?;

        let json = serde_json::to_string_pretty(entries).context("failed to serialize state")?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)
                .with_context(|| format!("failed to create {}", tmp.display()))?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to write state file: {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.lock().contains_key(key) {
            self.update(|entries| {
                entries.remove(key);
            })?;
        }
        Ok(())
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<()> {
        self.update(|entries| {
            for (key, value) in new_entries {
                entries.insert(key.to_string(), value.clone());
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Progress store over key-value storage
// ---------------------------------------------------------------------------

/// Progress store that keeps the snapshot under the `current*` keys.
///
/// The score is not kept locally; a restored session starts its score from
/// zero.
pub struct LocalProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalProgressStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// When the snapshot was last saved.
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .kv
            .get(KEY_SAVED_AT)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc)))
    }
}

#[async_trait]
impl ProgressStore for LocalProgressStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn load(&self) -> Result<Option<ProgressSnapshot>> {
        let Some(subject) = self.kv.get(KEY_SUBJECT)? else {
            return Ok(None);
        };

        let mode = match self.kv.get(KEY_MODE)? {
            Some(raw) => match raw.parse::<Mode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!("ignoring saved mode: {e}");
                    None
                }
            },
            None => None,
        };

        let card_index = match self.kv.get(KEY_CARD_INDEX)? {
            Some(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
                tracing::warn!("ignoring saved card index: {raw:?}");
                0
            }),
            None => 0,
        };

        Ok(Some(ProgressSnapshot {
            subject,
            mode,
            card_index,
            score: 0,
        }))
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        let mut entries: Vec<(&'static str, String)> = vec![
            (KEY_SUBJECT, snapshot.subject.clone()),
            (KEY_CARD_INDEX, snapshot.card_index.to_string()),
            (KEY_SAVED_AT, Utc::now().to_rfc3339()),
        ];
        if let Some(mode) = snapshot.mode {
            entries.push((KEY_MODE, mode.to_string()));
        }
        let kv = Arc::clone(&self.kv);
        tokio::task::spawn_blocking(move || kv.set_many(&entries)).await?
    }

    async fn clear(&self) -> Result<()> {
        let kv = Arc::clone(&self.kv);
        tokio::task::spawn_blocking(move || {
            for key in [KEY_SUBJECT, KEY_MODE, KEY_CARD_INDEX, KEY_SAVED_AT] {
                kv.remove(key)?;
            }
            Ok(())
        })
        .await?
    }
}

/// The user id for remote progress.
///
/// Uses `configured` when given, else the stored `userId`, else a fresh v4
/// UUID which is stored for next time.
pub fn resolve_user_id(kv: &dyn KeyValueStore, configured: Option<&str>) -> Result<String> {
    if let Some(id) = configured.filter(|id| !id.trim().is_empty()) {
        return Ok(id.to_string());
    }
    if let Some(id) = kv.get(KEY_USER_ID)? {
        return Ok(id);
    }
    let id = uuid::Uuid::new_v4().to_string();
    kv.set(KEY_USER_ID, &id)?;
    tracing::info!(user_id = %id, "generated new user id");
    Ok(id)
}
