//! Best-effort local persistence.
//!
//! The cache is a directory holding one file per key. Every fault is logged and
//! swallowed: a broken cache behaves like an empty one and never stops a session.

use log::{debug, error, warn};
use std::fs;
use std::path::{Path, PathBuf};

use canvass_core::Resident;

pub const RESIDENTS_KEY: &str = "election_field_residents";
pub const AUTH_KEY: &str = "election_field_auth";

#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> LocalCache {
        LocalCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Stores the full list of residents.
    pub fn save(&self, residents: &[Resident]) {
        match serde_json::to_string(residents) {
            Ok(js) => {
                self.put(RESIDENTS_KEY, &js);
                debug!("save: {} residents", residents.len());
            }
            Err(e) => error!("Failed to save to storage: {}", e),
        }
    }

    /// Reads the list back. Missing or unreadable data is an empty list.
    pub fn load(&self) -> Vec<Resident> {
        let contents = match self.get(RESIDENTS_KEY) {
            Some(c) => c,
            None => return Vec::new(),
        };
        match serde_json::from_str(&contents) {
            Ok(residents) => residents,
            Err(e) => {
                warn!("Failed to load from storage: {}", e);
                Vec::new()
            }
        }
    }

    pub fn clear(&self) {
        self.remove(RESIDENTS_KEY);
    }

    pub fn set_authenticated(&self, flag: bool) {
        if flag {
            self.put(AUTH_KEY, "true");
        } else {
            self.remove(AUTH_KEY);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get(AUTH_KEY).as_deref() == Some("true")
    }

    // Writes go through a temporary file and a rename.
    fn put(&self, key: &str, value: &str) {
        let path = self.slot_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));
        let res = fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&tmp, value))
            .and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = res {
            error!("Failed to write storage slot {:?}: {}", path, e);
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read storage slot {:?}: {}", path, e);
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("Failed to clear storage slot {:?}: {}", path, e),
        }
    }
}
