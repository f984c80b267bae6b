//! The only persistent state the core maintains: a JSON-on-disk map from
//! user id to `{public key, signature counter, credential id}`, loaded at
//! startup and replaced atomically on write so a crash mid-save never
//! leaves a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRecord {
    pub public_key: Vec<u8>,
    pub signature_counter: u64,
    pub credential_id: Vec<u8>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CredentialFile {
    #[serde(default)]
    credentials: FxHashMap<String, CredentialRecord>,
}

pub struct CredentialStore {
    path: PathBuf,
    by_user: FxHashMap<String, CredentialRecord>,
}

impl CredentialStore {
    /// Loads the store from `path`; a missing file is treated as an empty
    /// store rather than an error, since the file is created on first save.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let by_user = match fs::read_to_string(&path) {
            Ok(content) => {
                let file: CredentialFile =
                    serde_json::from_str(&content).map_err(|source| ConfigError::Json { path: path.clone(), source })?;
                file.credentials
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FxHashMap::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Ok(Self { path, by_user })
    }

    /// Replaces the file's contents atomically: writes to a temp file in
    /// the same directory, then renames it over the target, so readers
    /// never observe a partially-written store.
    pub fn save(&self) -> Result<(), ConfigError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| ConfigError::Write { path: self.path.clone(), source })?;
        let file = CredentialFile { credentials: self.by_user.clone() };
        let json = serde_json::to_string_pretty(&file).map_err(|source| ConfigError::Json { path: self.path.clone(), source })?;
        tmp.write_all(json.as_bytes()).map_err(|source| ConfigError::Write { path: self.path.clone(), source })?;
        tmp.persist(&self.path).map_err(|e| ConfigError::Write { path: self.path.clone(), source: e.error })?;
        Ok(())
    }

    pub fn register(&mut self, user_id: impl Into<String>, record: CredentialRecord) {
        self.by_user.insert(user_id.into(), record);
    }

    pub fn lookup_by_username(&self, user_id: &str) -> Option<&CredentialRecord> {
        self.by_user.get(user_id)
    }

    pub fn lookup_by_credential_id(&self, credential_id: &[u8]) -> Option<(&str, &CredentialRecord)> {
        self.by_user
            .iter()
            .find(|(_, record)| record.credential_id == credential_id)
            .map(|(user_id, record)| (user_id.as_str(), record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(id: u8) -> CredentialRecord {
        CredentialRecord { public_key: vec![1, 2, 3], signature_counter: 0, credential_id: vec![id] }
    }

    #[test]
    fn missing_file_loads_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("credentials.json")).unwrap();
        assert!(store.lookup_by_username("anyone").is_none());
    }

    #[test]
    fn save_then_load_round_trips_registered_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let mut store = CredentialStore::load(&path).unwrap();
        store.register("user-1", sample_record(7));
        store.save().unwrap();

        let reloaded = CredentialStore::load(&path).unwrap();
        assert_eq!(reloaded.lookup_by_username("user-1"), Some(&sample_record(7)));
        let (user_id, record) = reloaded.lookup_by_credential_id(&[7]).unwrap();
        assert_eq!(user_id, "user-1");
        assert_eq!(record, &sample_record(7));
    }

    #[test]
    fn registering_twice_for_the_same_user_replaces_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::load(dir.path().join("credentials.json")).unwrap();
        store.register("user-1", sample_record(1));
        store.register("user-1", sample_record(2));
        assert_eq!(store.lookup_by_username("user-1"), Some(&sample_record(2)));
    }
}
