//! Snapshot store — the last successfully-applied document per resource.
//!
//! Persists a `SnapshotFile` JSON document at
//! `<home>/.tidemark/snapshots/<resource>.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the key overlay.
//! The digest is the SHA-256 hex of the document's canonical JSON; callers
//! can compare it against a freshly-computed digest to detect drift without
//! deserializing the whole document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{io_err, ReconcileError};

/// On-disk snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotFile<T> {
    pub applied_at: DateTime<Utc>,
    pub digest: String,
    pub document: T,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotCompat<T> {
    Structured(SnapshotStructuredCompat<T>),
    Legacy(T),
}

#[derive(Debug, Deserialize)]
struct SnapshotStructuredCompat<T> {
    applied_at: Option<DateTime<Utc>>,
    document: T,
}

/// Path to the snapshot JSON for a given resource, rooted at `home`.
///
/// `~/.tidemark/snapshots/<resource>.json`
pub fn snapshot_path_at(home: &Path, resource: &str) -> PathBuf {
    home.join(".tidemark")
        .join("snapshots")
        .join(format!("{resource}.json"))
}

/// SHA-256 hex digest of a document's canonical JSON.
pub fn digest_of<T: Serialize>(document: &T) -> Result<String, ReconcileError> {
    let json = serde_json::to_string(document)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Load the snapshot for `resource`.
///
/// Returns `Ok(None)` if no snapshot has been written yet — the first-apply
/// signal. Accepts a legacy bare-document file (no metadata wrapper) and
/// rebuilds the wrapper around it.
pub fn load_at<T>(home: &Path, resource: &str) -> Result<Option<SnapshotFile<T>>, ReconcileError>
where
    T: Serialize + DeserializeOwned,
{
    let path = snapshot_path_at(home, resource);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let snapshot = match serde_json::from_str::<SnapshotCompat<T>>(&contents)? {
        SnapshotCompat::Structured(compat) => SnapshotFile {
            applied_at: compat.applied_at.unwrap_or_else(Utc::now),
            digest: digest_of(&compat.document)?,
            document: compat.document,
        },
        SnapshotCompat::Legacy(document) => SnapshotFile {
            applied_at: Utc::now(),
            digest: digest_of(&document)?,
            document,
        },
    };
    Ok(Some(snapshot))
}

/// Atomically save `document` as the snapshot for `resource`.
///
/// Writes to `<path>.tmp` then renames to `<path>`. Returns the written
/// snapshot, including its digest and `applied_at` stamp.
pub fn save_at<T: Serialize>(
    home: &Path,
    resource: &str,
    document: T,
) -> Result<SnapshotFile<T>, ReconcileError> {
    let path = snapshot_path_at(home, resource);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid snapshot path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let snapshot = SnapshotFile {
        applied_at: Utc::now(),
        digest: digest_of(&document)?,
        document,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
