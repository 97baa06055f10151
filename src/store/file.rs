use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{Store, StoreError};

/// One JSON file per document: `user:<id>` lives at `<root>/user/<hex(id)>.json`.
///
/// Ids are hex-encoded so keys differing only in case stay distinct on
/// case-insensitive filesystems.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let (collection, id) = split_key(key)?;
        if id.is_empty() || !is_safe_segment(id) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(collection).join(format!("{}.json", hex::encode(id))))
    }

    fn write_atomic(&self, path: &Path, value: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn split_key(key: &str) -> Result<(&str, &str), StoreError> {
    match key.split_once(':') {
        Some((collection, id)) if !collection.is_empty() && is_safe_collection(collection) => {
            Ok((collection, id))
        }
        _ => Err(StoreError::InvalidKey(key.to_string())),
    }
}

fn is_safe_collection(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

fn is_safe_segment(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        self.write_atomic(&path, value)
    }

    fn insert(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        if path.exists() {
            return Ok(false);
        }
        self.write_atomic(&path, value)?;
        Ok(true)
    }

    fn replace(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        if !path.exists() {
            return Ok(false);
        }
        self.write_atomic(&path, value)?;
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn get_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let (collection, id_prefix) = split_key(prefix)?;
        let dir = self.root.join(collection);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|stem| hex::decode(stem).ok())
                .and_then(|raw| String::from_utf8(raw).ok())
            else {
                continue;
            };
            if id.starts_with(id_prefix) {
                keys.push(format!("{}:{}", collection, id));
            }
        }
        Ok(keys)
    }
}
