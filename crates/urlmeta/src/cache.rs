//! Hash-addressed filesystem cache for metadata records
//!
//! There is no master index file: an entry's location is a pure function of
//! its key, so individual entries can be deleted by removing their directory.
//! Each entry directory stores the original key in a `key` file, which lets
//! lookups chain past hash collisions.

use crate::error::{Error, Result};
use crate::model::Metadata;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default cache root
pub const DATA_DIR_ENV: &str = "URLMETA_DATA_DIR";

/// Filename of the serialized record inside an entry directory
pub const METADATA_FILE: &str = "metadata.json";

/// Filename storing the raw key inside an entry directory
const KEY_FILE: &str = "key";

/// Resolve the cache root directory
///
/// Priority order: explicit argument, then the [`DATA_DIR_ENV`] environment
/// variable, then the platform user-data directory.
pub fn resolve_cache_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    ProjectDirs::from("", "", "urlmeta")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::CacheRoot("failed to determine user data directory".to_string()))
}

/// Directory store addressed by a hash of an arbitrary string key
///
/// For key `k` with sha256 hex digest `h`, the base directory is
/// `<root>/h[0]/h[1]/h[2]/h[3..]`, containing numbered entry directories
/// `000`, `001`, ... — normally just `000`; later slots only appear when
/// distinct keys collide on the same digest prefix path.
#[derive(Debug, Clone)]
pub struct DirCache {
    base: PathBuf,
}

impl DirCache {
    /// Open (creating if needed) a directory cache rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// The root directory of this cache
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Hex sha256 digest of a key
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Deterministic base directory for a key
    pub fn base_dir(&self, key: &str) -> PathBuf {
        let digest = Self::hash_key(key);
        self.base
            .join(&digest[0..1])
            .join(&digest[1..2])
            .join(&digest[2..3])
            .join(&digest[3..])
    }

    /// Look up the entry directory for a key
    ///
    /// `Ok(None)` is the miss signal, distinct from `Err` which reports an
    /// I/O failure while inspecting an existing entry.
    pub fn get(&self, key: &str) -> Result<Option<PathBuf>> {
        let base = self.base_dir(key);
        if !base.exists() {
            return Ok(None);
        }
        for slot in Self::slot_dirs(&base)? {
            if Self::key_matches(&slot, key)? {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    /// Return the entry directory for a key, creating it if absent
    ///
    /// On a fresh key this creates the first free numbered slot and writes
    /// the `key` file; on a known key it returns the existing slot.
    pub fn put(&self, key: &str) -> Result<PathBuf> {
        let base = self.base_dir(key);
        fs::create_dir_all(&base)?;
        for slot in Self::slot_dirs(&base)? {
            if Self::key_matches(&slot, key)? {
                return Ok(slot);
            }
        }
        let mut index = 0usize;
        loop {
            let candidate = base.join(format!("{index:03}"));
            if !candidate.exists() {
                fs::create_dir_all(&candidate)?;
                fs::write(candidate.join(KEY_FILE), key)?;
                return Ok(candidate);
            }
            index += 1;
        }
    }

    /// Whether an entry exists for this key
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn slot_dirs(base: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(base)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    fn key_matches(slot: &Path, key: &str) -> Result<bool> {
        let key_path = slot.join(KEY_FILE);
        if !key_path.exists() {
            return Ok(false);
        }
        Ok(fs::read_to_string(key_path)? == key)
    }
}

/// Typed cache persisting [`Metadata`] records keyed by normalized URL
#[derive(Debug, Clone)]
pub struct MetadataCache {
    dir_cache: DirCache,
}

impl MetadataCache {
    /// Open (creating if needed) a metadata cache under `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dir_cache: DirCache::new(data_dir)?,
        })
    }

    /// Whether a record is stored for this URL; does not validate contents
    pub fn has(&self, url: &str) -> Result<bool> {
        self.dir_cache.exists(url)
    }

    /// Load the stored record for a URL
    ///
    /// `Ok(None)` means no entry exists. An entry that is locatable but whose
    /// record file is missing or undeserializable is an error, never a miss.
    pub fn get(&self, url: &str) -> Result<Option<Metadata>> {
        let Some(dir) = self.dir_cache.get(url)? else {
            return Ok(None);
        };
        let raw = fs::read_to_string(dir.join(METADATA_FILE))?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Write (or overwrite) the record for a URL
    ///
    /// The record is synced to disk before returning, so a completed `put`
    /// survives process restarts.
    pub fn put(&self, url: &str, metadata: &Metadata) -> Result<()> {
        let dir = self.dir_cache.put(url)?;
        let file = fs::File::create(dir.join(METADATA_FILE))?;
        serde_json::to_writer_pretty(&file, metadata)?;
        file.sync_all()?;
        Ok(())
    }

    /// The entry directory for a URL, if one exists
    pub fn entry_dir(&self, url: &str) -> Result<Option<PathBuf>> {
        self.dir_cache.get(url)
    }
}
