//! Reading and writing session files.
//!
//! A session file is a JSON envelope around the session itself:
//!
//! ```json
//! { "checksum": "<sha256 of the compact session JSON>", "session": { ... } }
//! ```
//!
//! The checksum is computed over the compact serialization while the file is
//! written pretty-printed, so loading re-serializes compactly before comparing.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::session::data::{Session, SESSION_VERSION};

#[derive(Debug, Serialize, Deserialize)]
struct SessionEnvelope {
    checksum: String,
    session: Session,
}

fn checksum(session: &Session) -> Result<String> {
    let compact = serde_json::to_string(session).context("Failed to serialize session")?;
    let mut hasher = Sha256::new();
    hasher.update(compact.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

impl Session {
    /// Write the session with its integrity checksum.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create session file: {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write session to: {}", path.display()))?;
        log::info!(
            "Saved session with {} groups to {}",
            self.groups.len(),
            path.display()
        );
        Ok(())
    }

    /// Serialize into the checksummed envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let envelope = SessionEnvelope {
            checksum: checksum(self)?,
            session: self.clone(),
        };
        serde_json::to_string_pretty(&envelope).context("Failed to serialize session envelope")
    }

    /// Parse an envelope and verify checksum and version.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the checksum does not match,
    /// or the version is not [`SESSION_VERSION`].
    pub fn from_json(content: &str) -> Result<Self> {
        let envelope: SessionEnvelope = serde_json::from_str(content)
            .context("Failed to parse session file. It may be corrupted or not a session.")?;

        if checksum(&envelope.session)? != envelope.checksum {
            anyhow::bail!(
                "Session integrity check failed: checksum mismatch. The file may have been edited or corrupted."
            );
        }

        let session = envelope.session;
        if session.version != SESSION_VERSION {
            anyhow::bail!(
                "Unsupported session version: {}. Current version is {}.",
                session.version,
                SESSION_VERSION
            );
        }
        Ok(session)
    }

    /// Load and verify a session file.
    ///
    /// # Errors
    ///
    /// See [`Session::from_json`]; also fails if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session = Self::from_json(&content)
            .with_context(|| format!("Invalid session file: {}", path.display()))?;
        log::debug!(
            "Loaded session from {} ({} groups, created {})",
            path.display(),
            session.groups.len(),
            session.created_at
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::ScanSummary;
    use crate::resolver::ResolveError;
    use crate::session::data::{SessionFile, SessionGroup, SessionSettings, UnresolvedFile};
    use tempfile::tempdir;

    fn sample_session() -> Session {
        Session {
            version: SESSION_VERSION,
            created_at: chrono::Utc::now(),
            source: "https://www.googleapis.com/drive/v3".into(),
            settings: SessionSettings::default(),
            summary: ScanSummary::default(),
            groups: vec![SessionGroup {
                id: 1,
                hash: "h1".into(),
                size: 10,
                files: vec![
                    SessionFile {
                        id: "1".into(),
                        name: "a.txt".into(),
                        size: 10,
                        parents: vec!["F".into()],
                        path: Some("Docs".into()),
                        path_error: None,
                    },
                    SessionFile {
                        id: "2".into(),
                        name: "b.txt".into(),
                        size: 10,
                        parents: vec!["X".into()],
                        path: None,
                        path_error: Some(ResolveError::folder_not_found("X", "404")),
                    },
                ],
            }],
            unresolved: vec![UnresolvedFile {
                id: "2".into(),
                error: ResolveError::folder_not_found("X", "404"),
            }],
        }
    }

    #[test]
    fn test_to_json_has_envelope() {
        let json = sample_session().to_json().unwrap();
        assert!(json.contains("\"checksum\":"));
        assert!(json.contains("\"session\":"));
        assert!(json.contains("\"kind\": \"folder_not_found\""));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = sample_session();

        session.save(&path).unwrap();
        let loaded = Session::load(&path).unwrap();

        assert_eq!(loaded, session);
    }

    #[test]
    fn test_tampered_file_is_rejected() {
        let json = sample_session().to_json().unwrap();
        let tampered = json.replace("\"a.txt\"", "\"evil.txt\"");
        let err = Session::from_json(&tampered).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let mut session = sample_session();
        session.version = SESSION_VERSION + 1;
        let json = session.to_json().unwrap();
        let err = Session::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("Unsupported session version"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Session::from_json("not json").is_err());
        assert!(Session::from_json("{}").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(Session::load(&dir.path().join("missing.json")).is_err());
    }
}
