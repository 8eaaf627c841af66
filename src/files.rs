//! Stored-file management for document artifacts.
//!
//! Files are addressed by portal-style URLs: `/files/<name>` for public
//! material (stamp images) and `/private/files/<name>` for everything
//! bound to a document (main PDFs, demoted revisions, fiska artifacts).
//! Stored names get a random prefix so repeated uploads of the same
//! label never collide.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

pub const PUBLIC_URL_PREFIX: &str = "/files/";
pub const PRIVATE_URL_PREFIX: &str = "/private/files/";

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {url}")]
    NotFound { url: String },
    #[error("Not a stored-file reference: {url}")]
    InvalidReference { url: String },
    #[error("File I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reference to a stored file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredFile {
    /// Portal URL, the form persisted on documents.
    pub url: String,
    /// Original display name.
    pub file_name: String,
}

/// Storage backend for document artifacts. The service only ever talks
/// in URLs so tests can swap in the in-memory implementation.
pub trait FileStore: Send + Sync {
    fn save(&self, file_name: &str, content: &[u8], private: bool) -> Result<StoredFile, FileError>;
    fn read(&self, url: &str) -> Result<Vec<u8>, FileError>;
    fn exists(&self, url: &str) -> bool;
}

/// MIME type for serving a stored file, from its extension.
pub fn content_type(url: &str) -> String {
    mime_guess::from_path(url)
        .first_or_octet_stream()
        .to_string()
}

/// Sanitize a display name into a safe stored-name component. Keeps
/// Unicode letters and digits (Cyrillic labels stay readable), replaces
/// everything else, strips path traversal.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");
    // Truncate on char boundaries; labels are frequently Cyrillic.
    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

fn unique_stored_name(file_name: &str) -> String {
    let tag = Uuid::new_v4().simple().to_string();
    format!("{}_{}", &tag[..8], sanitize_file_name(file_name))
}

// ═══════════════════════════════════════════
// Disk-backed store
// ═══════════════════════════════════════════

/// Store writing under two roots mirroring the URL namespaces.
pub struct LocalFileStore {
    public_root: PathBuf,
    private_root: PathBuf,
}

impl LocalFileStore {
    pub fn new(public_root: PathBuf, private_root: PathBuf) -> Result<Self, FileError> {
        for root in [&public_root, &private_root] {
            fs::create_dir_all(root).map_err(|e| FileError::Io {
                path: root.display().to_string(),
                source: e,
            })?;
        }
        Ok(Self {
            public_root,
            private_root,
        })
    }

    /// Map a URL back to a path under the matching root. Rejects
    /// references that escape the stored-name namespace.
    fn resolve(&self, url: &str) -> Result<PathBuf, FileError> {
        let (root, rest): (&Path, &str) = if let Some(rest) = url.strip_prefix(PRIVATE_URL_PREFIX) {
            (&self.private_root, rest)
        } else if let Some(rest) = url.strip_prefix(PUBLIC_URL_PREFIX) {
            (&self.public_root, rest)
        } else {
            return Err(FileError::InvalidReference { url: url.into() });
        };
        if rest.is_empty() || rest.contains('/') || rest.contains('\\') || rest.contains("..") {
            return Err(FileError::InvalidReference { url: url.into() });
        }
        Ok(root.join(rest))
    }
}

impl FileStore for LocalFileStore {
    fn save(&self, file_name: &str, content: &[u8], private: bool) -> Result<StoredFile, FileError> {
        let stored_name = unique_stored_name(file_name);
        let (root, prefix) = if private {
            (&self.private_root, PRIVATE_URL_PREFIX)
        } else {
            (&self.public_root, PUBLIC_URL_PREFIX)
        };
        let path = root.join(&stored_name);
        fs::write(&path, content).map_err(|e| FileError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(StoredFile {
            url: format!("{prefix}{stored_name}"),
            file_name: file_name.to_string(),
        })
    }

    fn read(&self, url: &str) -> Result<Vec<u8>, FileError> {
        let path = self.resolve(url)?;
        if !path.is_file() {
            return Err(FileError::NotFound { url: url.into() });
        }
        fs::read(&path).map_err(|e| FileError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn exists(&self, url: &str) -> bool {
        self.resolve(url).map(|p| p.is_file()).unwrap_or(false)
    }
}

// ═══════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════

/// URL-compatible in-memory store for tests.
#[derive(Default)]
pub struct MemoryFileStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFileStore {
    fn save(&self, file_name: &str, content: &[u8], private: bool) -> Result<StoredFile, FileError> {
        let prefix = if private {
            PRIVATE_URL_PREFIX
        } else {
            PUBLIC_URL_PREFIX
        };
        let url = format!("{prefix}{}", unique_stored_name(file_name));
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(url.clone(), content.to_vec());
        Ok(StoredFile {
            url,
            file_name: file_name.to_string(),
        })
    }

    fn read(&self, url: &str) -> Result<Vec<u8>, FileError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(url)
            .cloned()
            .ok_or_else(|| FileError::NotFound { url: url.into() })
    }

    fn exists(&self, url: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(url)
    }
}
