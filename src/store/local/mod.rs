mod file;
mod mem;

use crate::Result;

pub use file::FileLocalStore;
pub use mem::MemLocalStore;

/// Client-local key-value cache.
///
/// Values are opaque serialized documents; the graph model owns the format.
pub trait LocalStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()>;

    /// Removes `key`. Returns whether it existed.
    fn remove(
        &self,
        key: &str,
    ) -> Result<bool>;

    /// Lists the stored keys.
    fn keys(&self) -> Result<Vec<String>>;
}
