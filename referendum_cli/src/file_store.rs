use parking_lot::Mutex;
use referendum::{Store, StoreError};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a state file: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: entry {key} is not valid hex: {source}", .path.display())]
    Hex {
        path: PathBuf,
        key: String,
        #[source]
        source: hex::FromHexError,
    },
}

/// A state store kept in a single JSON file
///
/// The file maps each key to its hex-encoded value. It is loaded once when
/// opened and rewritten in full on every put.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileStoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read(&path) {
            Ok(bytes) => decode(&path, &bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(FileStoreError::Io { path, source }),
        };

        Ok(FileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, Vec<u8>>) -> io::Result<()> {
        let encoded: BTreeMap<&str, String> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), hex::encode(v)))
            .collect();
        let json = serde_json::to_vec_pretty(&encoded)?;

        // Write a sibling file then rename, so a crash never leaves half a file
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, FileStoreError> {
    let encoded: BTreeMap<String, String> =
        serde_json::from_slice(bytes).map_err(|source| FileStoreError::Format {
            path: path.to_path_buf(),
            source,
        })?;

    encoded
        .into_iter()
        .map(|(key, value)| match hex::decode(&value) {
            Ok(value) => Ok((key, value)),
            Err(source) => Err(FileStoreError::Hex {
                path: path.to_path_buf(),
                key,
                source,
            }),
        })
        .collect()
}

impl Store for FileStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock();
        Ok(entries.get(key).filter(|v| !v.is_empty()).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.to_owned(), value);

        if let Err(e) = self.flush(&entries) {
            // Keep memory in step with what is on disk
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(StoreError::new(
                key,
                format!("unable to write {}: {}", self.path.display(), e),
            ));
        }

        Ok(())
    }
}
