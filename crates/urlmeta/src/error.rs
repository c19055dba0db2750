//! Error types for urlmeta

use thiserror::Error;

/// Convenience result alias for urlmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the cache and the top-level client
///
/// Ordinary network flakiness is never reported through this type: a failed
/// fetch degrades to a record with absent fields. These variants cover the
/// conditions that *are* fatal for a call — configuration problems and
/// inconsistent cache state.
#[derive(Debug, Error)]
pub enum Error {
    /// Cache root path collides with something that is not a directory,
    /// or no usable data directory could be determined
    #[error("invalid cache root: {0}")]
    CacheRoot(String),

    /// Filesystem operation on the cache failed
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The index reported an entry as present but it could not be read.
    /// Distinct from a miss: silently re-fetching here would mask data loss.
    #[error("inconsistent cache entry for '{url}': reported present but unreadable")]
    CacheInconsistent {
        /// The normalized URL whose entry failed to load
        url: String,
    },

    /// The built-in HTTP fetcher could not be constructed
    #[error("failed to initialize fetcher: {0}")]
    Fetcher(#[from] crate::fetch::FetchError),
}
