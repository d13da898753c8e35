//! Flat-file session store.
//!
//! One JSON file per session id in a per-user directory. There is no
//! locking: independent `nt` invocations read and write concurrently and
//! the last whole-file write wins. Writes go through a temp file and a
//! rename so readers never see a half-written record where rename is atomic.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::sessions::errors::SessionError;
use crate::sessions::types::Session;

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open the store under the configured base directory, creating it if needed.
    pub fn open(config: &Config) -> Result<Self, SessionError> {
        Self::at(config.sessions_dir())
    }

    pub fn at(dir: PathBuf) -> Result<Self, SessionError> {
        fs::create_dir_all(&dir).map_err(|e| SessionError::StoreIo {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", id.replace(['/', '\\'], "_")))
    }

    /// Replace the session's record in full.
    pub fn write(&self, session: &Session) -> Result<(), SessionError> {
        let path = self.record_path(&session.id);
        let json =
            serde_json::to_string_pretty(session).map_err(|e| SessionError::Serialization {
                id: session.id.clone(),
                message: e.to_string(),
            })?;

        // Unique per writer process so concurrent writers never share a temp file.
        let temp = path.with_extension(format!("json.{}.tmp", std::process::id()));

        if let Err(e) = fs::write(&temp, &json) {
            cleanup_temp_file(&temp, &e);
            return Err(SessionError::StoreIo {
                path: temp,
                source: e,
            });
        }

        if let Err(e) = fs::rename(&temp, &path) {
            cleanup_temp_file(&temp, &e);
            return Err(SessionError::StoreIo { path, source: e });
        }

        debug!(event = "core.store.write_completed", session_id = %session.id);
        Ok(())
    }

    /// Every readable record. Unreadable or unparsable files are skipped.
    pub fn list_all(&self) -> Vec<Session> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    event = "core.store.list_failed",
                    dir = %self.dir.display(),
                    error = %e
                );
                return Vec::new();
            }
        };

        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    debug!(
                        event = "core.store.read_skipped",
                        file = %path.display(),
                        error = %e
                    );
                    continue;
                }
            };

            match serde_json::from_str::<Session>(&content) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    warn!(
                        event = "core.store.invalid_record_skipped",
                        file = %path.display(),
                        error = %e
                    );
                }
            }
        }

        sessions.sort_by_key(|s| (s.numeric_id().unwrap_or(u64::MAX), s.id.clone()));
        sessions
    }

    pub fn list_for_repo(&self, repo_path: &Path) -> Vec<Session> {
        self.list_all()
            .into_iter()
            .filter(|s| s.belongs_to_repo(repo_path))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        let content = fs::read_to_string(self.record_path(id)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Remove a record. Removing a missing record is not an error.
    pub fn delete(&self, id: &str) -> Result<(), SessionError> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(event = "core.store.delete_completed", session_id = id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::StoreIo { path, source: e }),
        }
    }

    /// Next session id: one past the largest numeric id on disk.
    pub fn next_id(&self) -> String {
        let max = self
            .list_all()
            .iter()
            .filter_map(Session::numeric_id)
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}

fn cleanup_temp_file(temp_file: &Path, original_error: &std::io::Error) {
    if let Err(cleanup_err) = fs::remove_file(temp_file) {
        debug!(
            event = "core.store.temp_file_cleanup_failed",
            temp_file = %temp_file.display(),
            original_error = %original_error,
            cleanup_error = %cleanup_err
        );
    }
}
