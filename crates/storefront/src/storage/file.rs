//! File-backed key-value store.
//!
//! Each key is one `<key>.json` file in the state directory. Writes go to a
//! uniquely named temporary file which is then renamed over the target, so
//! readers in other processes never observe a half-written document. Two
//! processes writing the same key race; the last rename wins.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] persisted as JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        tracing::debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self
            .dir
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4().simple()));
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::write(&tmp, value).map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(e));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> (FileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("truffle-store-{}", uuid::Uuid::new_v4()));
        (FileStore::open(&dir).unwrap(), dir)
    }

    #[test]
    fn test_roundtrip_and_remove() {
        let (store, dir) = temp_store();

        assert_eq!(store.get("truffleCart").unwrap(), None);
        store.set("truffleCart", "[]").unwrap();
        assert_eq!(store.get("truffleCart").unwrap().as_deref(), Some("[]"));
        assert!(dir.join("truffleCart.json").exists());

        store.remove("truffleCart").unwrap();
        store.remove("truffleCart").unwrap();
        assert_eq!(store.get("truffleCart").unwrap(), None);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (store, dir) = temp_store();
        store.set("truffleUser", "{}").unwrap();
        store.set("truffleUser", "{\"name\":\"Ada\"}").unwrap();

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["truffleUser.json".to_string()]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (store, dir) = temp_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
        fs::remove_dir_all(dir).unwrap();
    }
}
