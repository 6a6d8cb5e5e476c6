//! Persistence for the catalog, the rule set and the suggestion set.
//!
//! [`FileStore`] keeps three files in the data directory:
//!
//! * `catalog.bin` - bincode, gzip compressed
//! * `rules.json` - pretty JSON, hand editable
//! * `suggestions.json` - pretty JSON
//!
//! Every save goes through a temp file and a rename, so a reader sees either
//! the old set or the new one.

use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use media_prune_models::{default_rules, Catalog, IdWatermarks, MediaKind, Suggestion, SuggestionRule};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;

pub trait LibraryStore: Send + Sync {
    fn load_catalog(&self) -> Result<Catalog, StoreError>;
    fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError>;

    /// Stored rules, or the built-in rules when none were ever saved
    fn load_rules(&self) -> Result<Vec<SuggestionRule>, StoreError>;
    fn save_rules(&self, rules: &[SuggestionRule]) -> Result<(), StoreError>;

    fn load_suggestions(&self) -> Result<Vec<Suggestion>, StoreError>;
    /// Replace the whole suggestion set
    fn save_suggestions(&self, suggestions: &[Suggestion]) -> Result<(), StoreError>;
}

pub struct FileStore {
    data_dir: PathBuf,
    use_compression: bool,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;
        Ok(Self {
            data_dir,
            use_compression: true,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.bin")
    }

    pub fn rules_path(&self) -> PathBuf {
        self.data_dir.join("rules.json")
    }

    pub fn suggestions_path(&self) -> PathBuf {
        self.data_dir.join("suggestions.json")
    }

    pub fn set_compression(&mut self, use_compression: bool) {
        self.use_compression = use_compression;
    }

    /// Empty the stored catalog, keeping only its id watermarks so ids handed
    /// out before stay retired. An unreadable catalog is replaced as well.
    /// Returns whether there was anything to clear.
    pub fn clear_catalog(&self) -> Result<bool, StoreError> {
        let watermarks = match self.load_catalog() {
            Ok(mut catalog) => {
                if catalog.is_empty() && catalog.episodes.is_empty() {
                    return Ok(false);
                }
                catalog.refresh_watermarks();
                catalog.watermarks
            }
            Err(StoreError::Corrupt { .. }) => {
                warn!("Replacing unreadable catalog with an empty one");
                self.watermarks_from_suggestions()
            }
            Err(e) => return Err(e),
        };
        self.save_catalog(&Catalog {
            watermarks,
            ..Catalog::default()
        })?;
        info!("Catalog cleared");
        Ok(true)
    }

    // Stored suggestions still name the media ids that were in use
    fn watermarks_from_suggestions(&self) -> IdWatermarks {
        let suggestions = self.load_suggestions().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read suggestions to recover id watermarks");
            Vec::new()
        });
        let highest = |kind: MediaKind| {
            suggestions
                .iter()
                .filter(|s| s.media_type == kind)
                .map(|s| s.media_id)
                .max()
                .unwrap_or(0)
        };
        IdWatermarks {
            movie: highest(MediaKind::Movie),
            series: highest(MediaKind::Series),
            episode: 0,
        }
    }

    pub fn clear_suggestions(&self) -> Result<bool, StoreError> {
        remove_if_exists(&self.suggestions_path())
    }

    fn load_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StoreError> {
        if !path.exists() {
            debug!("{} does not exist", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let value = serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }

    fn save_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &content)
    }

    fn decode_catalog(&self, data: Vec<u8>) -> std::io::Result<Vec<u8>> {
        if !self.use_compression {
            return Ok(data);
        }
        let mut decoder = GzDecoder::new(&data[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(decompressed)
    }

    /// Keep a copy of an unreadable catalog next to the live one
    fn backup_unreadable_catalog(&self, error: &bincode::Error) {
        let path = self.catalog_path();
        let backup_path = path.with_extension("bin.bak");
        match std::fs::copy(&path, &backup_path) {
            Ok(_) => warn!(
                "Catalog is unreadable (error: {}). Backed it up to {:?}",
                error, backup_path
            ),
            Err(backup_err) => warn!(
                "Catalog is unreadable (error: {}) and the backup failed: {}",
                error, backup_err
            ),
        }
    }
}

impl LibraryStore for FileStore {
    fn load_catalog(&self) -> Result<Catalog, StoreError> {
        let path = self.catalog_path();
        if !path.exists() {
            debug!("Catalog file does not exist, starting with an empty catalog");
            return Ok(Catalog::new());
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let loaded = self
            .decode_catalog(data)
            .map_err(|e| bincode::Error::from(bincode::ErrorKind::Io(e)))
            .and_then(|decoded| deserialize::<Catalog>(&decoded));
        let catalog = match loaded {
            Ok(catalog) => catalog,
            Err(source) => {
                self.backup_unreadable_catalog(&source);
                return Err(StoreError::Corrupt { path, source });
            }
        };

        debug!(
            movies = catalog.movies.len(),
            series = catalog.series.len(),
            episodes = catalog.episodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded catalog"
        );
        Ok(catalog)
    }

    fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let start = std::time::Instant::now();
        let serialized = serialize(catalog)?;

        let encoded = if self.use_compression {
            let path = self.catalog_path();
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&serialized).map_err(|e| StoreError::io(&path, e))?;
            encoder.finish().map_err(|e| StoreError::io(&path, e))?
        } else {
            serialized
        };
        write_atomic(&self.catalog_path(), &encoded)?;

        info!(
            "Saved catalog: {} movies, {} series, {} episodes in {:?}",
            catalog.movies.len(),
            catalog.series.len(),
            catalog.episodes.len(),
            start.elapsed()
        );
        Ok(())
    }

    fn load_rules(&self) -> Result<Vec<SuggestionRule>, StoreError> {
        match self.load_json(&self.rules_path())? {
            Some(rules) => Ok(rules),
            None => {
                debug!("No stored rules, using built-in rules");
                Ok(default_rules())
            }
        }
    }

    fn save_rules(&self, rules: &[SuggestionRule]) -> Result<(), StoreError> {
        self.save_json(&self.rules_path(), rules)?;
        debug!("Saved {} rules", rules.len());
        Ok(())
    }

    fn load_suggestions(&self) -> Result<Vec<Suggestion>, StoreError> {
        Ok(self.load_json(&self.suggestions_path())?.unwrap_or_default())
    }

    fn save_suggestions(&self, suggestions: &[Suggestion]) -> Result<(), StoreError> {
        self.save_json(&self.suggestions_path(), suggestions)?;
        debug!("Saved {} suggestions", suggestions.len());
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, content).map_err(|e| StoreError::io(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<bool, StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// In-process store, used by tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    catalog: Catalog,
    rules: Option<Vec<SuggestionRule>>,
    suggestions: Vec<Suggestion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.catalog = catalog;
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LibraryStore for MemoryStore {
    fn load_catalog(&self) -> Result<Catalog, StoreError> {
        Ok(self.lock()?.catalog.clone())
    }

    fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.lock()?.catalog = catalog.clone();
        Ok(())
    }

    fn load_rules(&self) -> Result<Vec<SuggestionRule>, StoreError> {
        Ok(self.lock()?.rules.clone().unwrap_or_else(default_rules))
    }

    fn save_rules(&self, rules: &[SuggestionRule]) -> Result<(), StoreError> {
        self.lock()?.rules = Some(rules.to_vec());
        Ok(())
    }

    fn load_suggestions(&self) -> Result<Vec<Suggestion>, StoreError> {
        Ok(self.lock()?.suggestions.clone())
    }

    fn save_suggestions(&self, suggestions: &[Suggestion]) -> Result<(), StoreError> {
        self.lock()?.suggestions = suggestions.to_vec();
        Ok(())
    }
}
