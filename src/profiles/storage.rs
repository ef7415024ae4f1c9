//! Profile persistence - save and load the profile blob.
//!
//! The blob lives under the fixed key [`STORAGE_KEY`] of a JSON document.
//! Other top-level keys in that document are preserved on save.

use crate::base::context::IoResultExt;
use crate::base::profileerror::ProfileError;
use crate::profiles::record::ProfileBlob;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::{future::Future, pin::Pin};

/// Key of the profile blob inside the storage document.
pub const STORAGE_KEY: &str = "profiles";

/// Alias for the `Future` returned by [`ProfileStorage::load`].
pub type Loading<'a> = Pin<Box<dyn Future<Output = Result<ProfileBlob, ProfileError>> + Send + 'a>>;

/// Alias for the `Future` returned by [`ProfileStorage::save`].
pub type Saving<'a> = Pin<Box<dyn Future<Output = Result<(), ProfileError>> + Send + 'a>>;

/// Durable storage for the whole profile blob.
///
/// Implementations only move the blob in and out; serialization of access is
/// the [`ProfileStore`](crate::profiles::store::ProfileStore)'s job.
pub trait ProfileStorage: Send + Sync {
    /// Load the blob. Missing storage is an empty blob, not an error.
    fn load(&self) -> Loading<'_>;

    /// Replace the persisted blob.
    fn save(&self, blob: ProfileBlob) -> Saving<'_>;
}

/// Blanket implementation for Arc-wrapped storages.
impl<S: ProfileStorage + ?Sized> ProfileStorage for Arc<S> {
    fn load(&self) -> Loading<'_> {
        (**self).load()
    }

    fn save(&self, blob: ProfileBlob) -> Saving<'_> {
        (**self).save(blob)
    }
}

/// On-disk document: the profile blob plus whatever else shares the file.
#[derive(Serialize, Deserialize, Debug, Default)]
struct StorageDocument {
    #[serde(default, rename = "profiles")]
    profiles: ProfileBlob,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl StorageDocument {
    fn parse(text: &str) -> Result<Self, ProfileError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(text)?)
    }

    fn render(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// In-process storage holding the serialized document.
///
/// Every load parses and every save re-serializes, so callers observe the
/// same JSON round trip as with a file.
#[derive(Debug, Default)]
pub struct MemoryProfileStorage {
    document: Mutex<String>,
}

impl MemoryProfileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing JSON document.
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(json.into()),
        }
    }

    /// The current serialized document.
    pub fn snapshot(&self) -> Result<String, ProfileError> {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .map_err(|_| ProfileError::storage_unavailable("memory storage lock poisoned"))
    }

    fn replace(&self, text: String) -> Result<(), ProfileError> {
        let mut doc = self
            .document
            .lock()
            .map_err(|_| ProfileError::storage_unavailable("memory storage lock poisoned"))?;
        *doc = text;
        Ok(())
    }
}

impl ProfileStorage for MemoryProfileStorage {
    fn load(&self) -> Loading<'_> {
        Box::pin(async move {
            let text = self.snapshot()?;
            Ok(StorageDocument::parse(&text)?.profiles)
        })
    }

    fn save(&self, blob: ProfileBlob) -> Saving<'_> {
        Box::pin(async move {
            let mut document = StorageDocument::parse(&self.snapshot()?)?;
            document.profiles = blob;
            self.replace(document.render()?)
        })
    }
}

/// File-backed JSON storage.
///
/// Saves write a sibling `.tmp` file and rename it over the target.
///
/// # Example
/// ```ignore
/// let storage = JsonFileStorage::new("/path/to/profiles.json");
/// let blob = storage.load().await?;
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_document(&self) -> Result<StorageDocument, ProfileError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => StorageDocument::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StorageDocument::default()),
            Err(e) => Err::<StorageDocument, _>(e).read_context(&self.path),
        }
    }
}

impl ProfileStorage for JsonFileStorage {
    fn load(&self) -> Loading<'_> {
        Box::pin(async move {
            let document = self.read_document().await?;
            tracing::debug!(path = %self.path.display(), domains = document.profiles.len(), "loaded profile storage");
            Ok(document.profiles)
        })
    }

    fn save(&self, blob: ProfileBlob) -> Saving<'_> {
        Box::pin(async move {
            let mut document = self.read_document().await?;
            document.profiles = blob;
            let json = document.render()?;

            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .write_context(&self.path)?;
            }

            let temp = self.temp_path();
            tokio::fs::write(&temp, json).await.write_context(&temp)?;
            tokio::fs::rename(&temp, &self.path)
                .await
                .write_context(&self.path)?;

            tracing::debug!(path = %self.path.display(), "saved profile storage");
            Ok(())
        })
    }
}
