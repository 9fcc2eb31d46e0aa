//! Versioned response store
//!
//! One subdirectory per cache generation, each holding an append-only body
//! log (`cache.dat`) plus a JSON metadata index (`index.json`). Entries map
//! request identity (path + query, as requested) to the last response seen
//! for it. A put for an existing key appends a fresh record and repoints the
//! index entry; stale bytes stay in the log until the generation is pruned.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{QuiverError, Result};
use super::types::{CachedResponse, StoreStats};

const DATA_FILE: &str = "cache.dat";
const INDEX_FILE: &str = "index.json";

/// Index entry for one cached response. The body lives in the data log at
/// `offset..offset + size`; everything else is inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    offset: u64,
    size: u64,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: u64,
}

/// Registry of version-tagged cache stores under one root directory.
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    /// Create the registry, creating the root directory if absent
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        fs::create_dir_all(root.as_ref()).map_err(|e| QuiverError::Io(e.to_string()))?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    /// Open the store for `version`, creating it if absent
    pub fn open(&self, version: &str) -> Result<CacheStore> {
        CacheStore::open(self.root.join(version), version)
    }

    /// List every version tag currently on disk
    pub fn names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| QuiverError::Io(e.to_string()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| QuiverError::Io(e.to_string()))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| QuiverError::Io(e.to_string()))?
                .is_dir();
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete the store for `version` wholesale. Returns whether anything
    /// was removed.
    pub fn delete(&self, version: &str) -> Result<bool> {
        let dir = self.root.join(version);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(|e| QuiverError::Io(e.to_string()))?;
        Ok(true)
    }
}

/// One open cache generation
#[derive(Clone)]
pub struct CacheStore {
    version: String,
    directory: PathBuf,
    index: Arc<RwLock<HashMap<String, EntryMeta>>>,
    data_file: Arc<RwLock<File>>,
    stats: Arc<RwLock<StoreStats>>,
}

impl CacheStore {
    fn open(directory: PathBuf, version: &str) -> Result<Self> {
        fs::create_dir_all(&directory).map_err(|e| QuiverError::Io(e.to_string()))?;

        let data_path = directory.join(DATA_FILE);
        let data_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&data_path)
            .map_err(|e| QuiverError::Io(e.to_string()))?;

        let index = Self::load_index(&directory)?;

        let stats = StoreStats {
            entries: index.len(),
            size_bytes: data_file.metadata().map(|m| m.len()).unwrap_or(0),
            ..StoreStats::default()
        };

        info!(
            "Opened cache store '{}' with {} entries",
            version,
            index.len()
        );

        Ok(Self {
            version: version.to_string(),
            directory,
            index: Arc::new(RwLock::new(index)),
            data_file: Arc::new(RwLock::new(data_file)),
            stats: Arc::new(RwLock::new(stats)),
        })
    }

    /// Load index from disk
    fn load_index(directory: &Path) -> Result<HashMap<String, EntryMeta>> {
        let index_path = directory.join(INDEX_FILE);

        if !index_path.exists() {
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&index_path).map_err(|e| QuiverError::Io(e.to_string()))?;

        serde_json::from_str(&contents)
            .map_err(|e| QuiverError::Serialization(format!("failed to parse index: {e}")))
    }

    /// Save index to disk
    fn save_index(&self) -> Result<()> {
        let index_path = self.directory.join(INDEX_FILE);
        let index = self.index.read();

        let json = serde_json::to_string(&*index)
            .map_err(|e| QuiverError::Serialization(e.to_string()))?;

        fs::write(&index_path, json).map_err(|e| QuiverError::Io(e.to_string()))?;

        Ok(())
    }

    /// Version tag this store was opened under
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Store a response under `key`, replacing any prior entry.
    ///
    /// The body is appended and flushed before the index is repointed, so a
    /// concurrent reader never observes a half-written entry.
    pub async fn put(&self, key: &str, response: &CachedResponse) -> Result<()> {
        debug!(
            "PUT key={} status={} size={}",
            key,
            response.status,
            response.body.len()
        );

        let size = response.body.len() as u64;

        let offset = {
            let mut file = self.data_file.write();
            let offset = file
                .seek(SeekFrom::End(0))
                .map_err(|e| QuiverError::Io(e.to_string()))?;
            file.write_all(&response.body)
                .map_err(|e| QuiverError::Io(e.to_string()))?;
            file.flush().map_err(|e| QuiverError::Io(e.to_string()))?;
            offset
        };

        let meta = EntryMeta {
            key: key.to_string(),
            offset,
            size,
            status: response.status,
            headers: response.headers.clone(),
            stored_at: response.stored_at,
        };
        let replaced = self.index.write().insert(key.to_string(), meta).is_some();

        {
            let mut stats = self.stats.write();
            stats.puts += 1;
            stats.size_bytes += size;
            if !replaced {
                stats.entries += 1;
            }
        }

        self.save_index()
    }

    /// Look up `key`. Absent is not an error.
    pub async fn match_entry(&self, key: &str) -> Result<Option<CachedResponse>> {
        let meta = { self.index.read().get(key).cloned() };

        match meta {
            Some(meta) => {
                let mut buffer = vec![0u8; meta.size as usize];
                {
                    let mut file = self.data_file.write();
                    file.seek(SeekFrom::Start(meta.offset))
                        .map_err(|e| QuiverError::Io(e.to_string()))?;
                    file.read_exact(&mut buffer)
                        .map_err(|e| QuiverError::Io(e.to_string()))?;
                }

                self.stats.write().hits += 1;
                Ok(Some(CachedResponse {
                    status: meta.status,
                    headers: meta.headers,
                    body: buffer,
                    stored_at: meta.stored_at,
                }))
            }
            None => {
                self.stats.write().misses += 1;
                Ok(None)
            }
        }
    }

    /// Check whether an entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.index.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Get statistics
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }
}
