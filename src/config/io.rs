//! Loading and saving project documents.
//!
//! Documents are JSON, key order preserved, written pretty-printed with
//! four-space indentation. Writes go to a temporary file first and are then
//! renamed over the target.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::error::ConfigError;
use super::store::Document;

/// Provenance of a loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    /// File the document was read from
    pub path: PathBuf,

    /// SHA-256 digest of the raw file bytes
    pub digest: String,
}

/// SHA-256 of raw bytes, hex encoded.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Parse a document from JSON text.
pub fn parse_document(contents: &str, path: &Path) -> Result<Document, ConfigError> {
    let value: Value = serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    into_document(value, path)
}

fn into_document(value: Value, path: &Path) -> Result<Document, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject(path.to_path_buf())),
    }
}

/// Render a document as pretty JSON with a trailing newline.
pub fn render_document(doc: &Document) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Load a document and record where it came from.
pub fn load_document(path: &Path) -> Result<(Document, ConfigSource), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = digest_bytes(&bytes);

    // Invalid UTF-8 is a parse error, never silently replaced.
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = into_document(value, path)?;
    tracing::debug!(path = %path.display(), %digest, "loaded flow configuration");

    Ok((
        doc,
        ConfigSource {
            path: path.to_path_buf(),
            digest,
        },
    ))
}

/// Write a document atomically, returning the digest of what was written.
pub fn save_document(doc: &Document, path: &Path) -> Result<String, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = render_document(doc).map_err(|source| ConfigError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    // Write to temp file first
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &bytes).map_err(io_err)?;

    // Atomic rename
    fs::rename(&temp_path, path).map_err(io_err)?;

    let digest = digest_bytes(&bytes);
    tracing::debug!(path = %path.display(), %digest, "saved flow configuration");
    Ok(digest)
}

/// Digest of the file currently on disk, or `None` if it does not exist.
pub fn digest_on_disk(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(digest_bytes(&bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
