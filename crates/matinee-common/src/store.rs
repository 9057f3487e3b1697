// Matinee
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Whole-document JSON persistence.
//!
//! Every mutation in the platform is load-whole-document, mutate in memory,
//! save-whole-document. There is no isolation between concurrent writers;
//! each document carries a version stamp so a lost update is at least
//! detected and logged when it happens.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::error::Result;

/// A named document plus the version it was loaded at.
#[derive(Debug)]
pub struct Document<T> {
    name: String,
    version: u64,
    pub data: T,
}

impl<T> Document<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u64,
    data: T,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Loads `name`, falling back to `T::default()` when the file is absent
    /// or does not parse. Never errors.
    pub fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Document<T> {
        let path = self.path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(document = name, "document absent, starting empty");
                return Document {
                    name: name.to_owned(),
                    version: 0,
                    data: T::default(),
                };
            }
            Err(err) => {
                warn!(document = name, error =% err, "failed to read document");
                return Document {
                    name: name.to_owned(),
                    version: 0,
                    data: T::default(),
                };
            }
        };

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) => Document {
                name: name.to_owned(),
                version: envelope.version,
                data: envelope.data,
            },
            // Documents written before version stamps existed are bare
            // payloads; read them at version 0.
            Err(_) => match serde_json::from_str::<T>(&raw) {
                Ok(data) => Document {
                    name: name.to_owned(),
                    version: 0,
                    data,
                },
                Err(err) => {
                    warn!(document = name, error =% err, "corrupt document, starting empty");
                    Document {
                        name: name.to_owned(),
                        version: 0,
                        data: T::default(),
                    }
                }
            },
        }
    }

    /// Serializes the whole value and replaces the document. Failures are
    /// logged, not propagated; the caller cannot distinguish a failed save
    /// from a successful one.
    pub fn save<T: Serialize>(&self, doc: &mut Document<T>) {
        let path = self.path(&doc.name);

        // The stamp only detects the read-modify-write race, it does not
        // prevent it: the write below still wins.
        if let Some(on_disk) = self.disk_version(&path)
            && on_disk != doc.version
        {
            warn!(
                document =% doc.name,
                loaded = doc.version,
                on_disk,
                "lost update: document changed since it was loaded"
            );
        }

        let envelope = Envelope {
            version: doc.version + 1,
            data: &doc.data,
        };
        let serialized = match serde_json::to_string_pretty(&envelope) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!(document =% doc.name, error =% err, "failed to serialize document");
                return;
            }
        };
        match fs::write(&path, serialized) {
            Ok(()) => doc.version += 1,
            Err(err) => {
                error!(document =% doc.name, error =% err, "failed to write document");
            }
        }
    }
}

/// Directory holding one runner instance's documents, keyed by bot username.
pub fn runner_dir(base: &Path, username: &str) -> PathBuf {
    let name = sanitise_file_name::sanitise(username.trim_start_matches('@'));
    base.join("runners").join(name)
}

impl DocumentStore {
    fn disk_version(&self, path: &Path) -> Option<u64> {
        let raw = fs::read_to_string(path).ok()?;
        let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
        value.get("version")?.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn absent_document_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();
        let doc: Document<BTreeMap<String, u64>> = store.load("accounts");
        assert!(doc.data.is_empty());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn corrupt_document_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("accounts.json"), "{not json").unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();
        let doc: Document<BTreeMap<String, u64>> = store.load("accounts");
        assert!(doc.data.is_empty());
    }

    #[test]
    fn save_and_reload_round_trips_and_bumps_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();
        let mut doc: Document<BTreeMap<String, u64>> = store.load("stats");
        doc.data.insert("42".into(), 7);
        store.save(&mut doc);
        assert_eq!(doc.version(), 1);

        let reloaded: Document<BTreeMap<String, u64>> = store.load("stats");
        assert_eq!(reloaded.version(), 1);
        assert_eq!(reloaded.data.get("42"), Some(&7));
    }

    #[test]
    fn bare_legacy_document_reads_at_version_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("channels.json"), r#"["-1001234"]"#).unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();
        let doc: Document<Vec<String>> = store.load("channels");
        assert_eq!(doc.version(), 0);
        assert_eq!(doc.data, vec!["-1001234".to_owned()]);
    }

    #[test]
    fn concurrent_writer_is_detected_but_not_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();

        let mut first: Document<Vec<String>> = store.load("channels");
        let mut second: Document<Vec<String>> = store.load("channels");

        first.data.push("-100111".into());
        store.save(&mut first);

        // `second` was loaded at version 0; the disk is now at version 1.
        // The save goes through regardless (last writer wins).
        second.data.push("-100222".into());
        store.save(&mut second);

        let reloaded: Document<Vec<String>> = store.load("channels");
        assert_eq!(reloaded.data, vec!["-100222".to_owned()]);
    }

    #[test]
    fn runner_dir_strips_marker_and_sanitizes() {
        let base = Path::new("/var/lib/matinee");
        let dir = runner_dir(base, "@my_movie_bot");
        assert_eq!(dir, base.join("runners").join("my_movie_bot"));
    }
}
