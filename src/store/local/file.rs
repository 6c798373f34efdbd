use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::trace;

use crate::{
    FlowCanvasError, Result,
    store::{LocalStore, map_store_err},
};

const EXTENSION: &str = "json";

/// Local store keeping one `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    /// Opens the store, creating the directory when missing.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref()).map_err(map_store_err)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    fn path_of(
        &self,
        key: &str,
    ) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(FlowCanvasError::Store(format!("invalid cache key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, EXTENSION)))
    }
}

impl LocalStore for FileLocalStore {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        trace!("FileLocalStore::get({})", key);
        match fs::read_to_string(self.path_of(key)?) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_store_err(err)),
        }
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        trace!("FileLocalStore::set({})", key);
        fs::write(self.path_of(key)?, value).map_err(map_store_err)
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<bool> {
        trace!("FileLocalStore::remove({})", key);
        match fs::remove_file(self.path_of(key)?) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(map_store_err(err)),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(map_store_err)? {
            let path = entry.map_err(map_store_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
