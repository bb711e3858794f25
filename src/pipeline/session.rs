use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// Where the session is in its upload/query cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No file has been indexed.
    #[default]
    Empty,
    /// The index is being wiped ahead of a new file.
    Resetting,
    /// A file is being parsed, embedded and upserted.
    Indexing,
    /// A file is indexed and questions can be answered.
    Ready,
    /// A question is being answered.
    Querying,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Empty => "empty",
            SessionPhase::Resetting => "resetting",
            SessionPhase::Indexing => "indexing",
            SessionPhase::Ready => "ready",
            SessionPhase::Querying => "querying",
        };
        f.write_str(name)
    }
}

/// Identifies an uploaded file: its name plus a digest of its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub name: String,
    /// Lowercase hex SHA-256 of the file contents
    pub digest: String,
}

impl FileIdentity {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            digest: hex::encode(Sha256::digest(bytes)),
        }
    }
}

/// A file saved to disk by the HTTP layer, ready for ingestion.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub identity: FileIdentity,
    pub path: PathBuf,
}

/// State of the single user session.
///
/// Owned by the application state and handed to the pipeline by `&mut`, so
/// one request at a time sees and mutates it.
#[derive(Debug, Default)]
pub struct Session {
    /// The file whose content is currently in the index
    pub current_file: Option<FileIdentity>,
    /// Whether at least one chunk of `current_file` was upserted
    pub index_ready: bool,
    pub phase: SessionPhase,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `identity` is the file already indexed.
    pub fn is_current(&self, identity: &FileIdentity) -> bool {
        self.current_file.as_ref() == Some(identity)
    }

    /// Forget the current file and go back to [`SessionPhase::Empty`].
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_digest_is_sha256_hex() {
        let id = FileIdentity::from_bytes("a.txt", b"abc");
        assert_eq!(
            id.digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_identity_depends_on_name_and_content() {
        let a = FileIdentity::from_bytes("a.txt", b"same");
        assert_eq!(a, FileIdentity::from_bytes("a.txt", b"same"));
        assert_ne!(a, FileIdentity::from_bytes("b.txt", b"same"));
        assert_ne!(a, FileIdentity::from_bytes("a.txt", b"edited"));
    }

    #[test]
    fn test_phase_display_names() {
        assert_eq!(SessionPhase::default().to_string(), "empty");
        assert_eq!(SessionPhase::Resetting.to_string(), "resetting");
        assert_eq!(SessionPhase::Indexing.to_string(), "indexing");
    }

    #[test]
    fn test_session_clear() {
        let mut session = Session {
            current_file: Some(FileIdentity::from_bytes("a.txt", b"x")),
            index_ready: true,
            phase: SessionPhase::Ready,
        };
        assert!(session.is_current(&FileIdentity::from_bytes("a.txt", b"x")));

        session.clear();
        assert!(session.current_file.is_none());
        assert!(!session.index_ready);
        assert_eq!(session.phase, SessionPhase::Empty);
    }
}
