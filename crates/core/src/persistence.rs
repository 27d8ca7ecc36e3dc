//! Disk persistence for an index + document store pair.
//!
//! A store is saved as two sibling artifacts derived from one base path:
//! `<base>.index` holds the vector index blob and `<base>.docs` holds the
//! bincode-serialized `documents` / `metadata` sequences. Each artifact gets a
//! CRC32 footer `[magic "PCR1"][u32 CRC32 BE]` and is written via temp-file +
//! rename.
//!
//! The pair is NOT written atomically: a crash between the two renames can
//! leave a new `.index` next to an old `.docs`. `load` detects the resulting
//! length mismatch and reports it as [`RetrievalError::Load`].

use crate::document::Metadata;
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Magic bytes preceding the CRC32 footer of each artifact.
const ARTIFACT_CRC_MAGIC: &[u8; 4] = b"PCR1";
const FOOTER_LEN: usize = 8;

/// Extension of the vector index artifact.
pub const INDEX_EXTENSION: &str = "index";
/// Extension of the documents + metadata artifact.
pub const DOCS_EXTENSION: &str = "docs";

/// Deterministic artifact locations for one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub docs: PathBuf,
}

impl ArtifactPaths {
    /// Appends `.index` / `.docs` to the full base path (no extension replacement).
    pub fn new(base: &Path) -> Self {
        Self {
            index: with_suffix(base, INDEX_EXTENSION),
            docs: with_suffix(base, DOCS_EXTENSION),
        }
    }
}

fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[derive(Serialize)]
struct DocsArtifactRef<'a> {
    documents: &'a [String],
    metadata: &'a [Metadata],
}

#[derive(Deserialize)]
struct DocsArtifact {
    documents: Vec<String>,
    metadata: Vec<Metadata>,
}

/// Writes `payload` + CRC footer to `path` via a temp file and rename.
fn write_artifact(path: &Path, payload: &[u8]) -> io::Result<u32> {
    let crc = crc32fast::hash(payload);
    let mut output = Vec::with_capacity(payload.len() + FOOTER_LEN);
    output.extend_from_slice(payload);
    output.extend_from_slice(ARTIFACT_CRC_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());

    let tmp_path = with_suffix(path, "tmp");
    fs::write(&tmp_path, &output)?;
    fs::rename(&tmp_path, path)?;
    Ok(crc)
}

/// Reads an artifact and returns its payload after verifying the CRC footer.
fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    let mut raw = fs::read(path)
        .map_err(|e| RetrievalError::load(format!("cannot read {}: {e}", path.display())))?;

    if raw.len() < FOOTER_LEN || &raw[raw.len() - 8..raw.len() - 4] != ARTIFACT_CRC_MAGIC {
        return Err(RetrievalError::load(format!(
            "{} has no checksum footer",
            path.display()
        )));
    }
    let n = raw.len();
    let stored_crc = u32::from_be_bytes([raw[n - 4], raw[n - 3], raw[n - 2], raw[n - 1]]);
    raw.truncate(n - FOOTER_LEN);
    let computed_crc = crc32fast::hash(&raw);
    if computed_crc != stored_crc {
        return Err(RetrievalError::load(format!(
            "CRC32 mismatch in {}: expected {stored_crc:#010x}, got {computed_crc:#010x}",
            path.display()
        )));
    }
    tracing::debug!("Artifact {:?} CRC32 verified: {:#010x}", path, stored_crc);
    Ok(raw)
}

/// Saves the index and store under `base`, creating parent directories.
///
/// The index and store must already be aligned; this is checked and a
/// mismatch is reported as [`RetrievalError::Index`] without writing.
pub fn save<I: VectorIndex>(base: &Path, index: &I, store: &DocumentStore) -> Result<()> {
    if index.len() != store.len() {
        return Err(RetrievalError::Index {
            position: index.len().max(store.len()),
            len: index.len().min(store.len()),
        });
    }

    let paths = ArtifactPaths::new(base);
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let docs = bincode::serialize(&DocsArtifactRef {
        documents: store.documents(),
        metadata: store.metadata(),
    })
    .map_err(|e| io::Error::other(e.to_string()))?;

    let index_crc = write_artifact(&paths.index, &index.to_bytes())?;
    let docs_crc = write_artifact(&paths.docs, &docs)?;

    tracing::info!(
        "Saved knowledge base to {:?} ({} passages, index CRC32={:#010x}, docs CRC32={:#010x})",
        base,
        store.len(),
        index_crc,
        docs_crc
    );
    Ok(())
}

/// Loads the artifact pair under `base`.
///
/// Returns `Ok(None)` when neither artifact exists (first run). A lone
/// artifact, a checksum failure, an undecodable payload, or misaligned
/// lengths all fail with [`RetrievalError::Load`].
pub fn load<I: VectorIndex>(base: &Path) -> Result<Option<(I, DocumentStore)>> {
    let paths = ArtifactPaths::new(base);
    match (paths.index.exists(), paths.docs.exists()) {
        (false, false) => {
            tracing::debug!("No persisted knowledge base at {:?}", base);
            return Ok(None);
        }
        (true, false) | (false, true) => {
            return Err(RetrievalError::load(format!(
                "incomplete artifact pair at {}: index present={}, docs present={}",
                base.display(),
                paths.index.exists(),
                paths.docs.exists()
            )));
        }
        (true, true) => {}
    }

    let index = I::from_bytes(&read_artifact(&paths.index)?)?;
    let docs: DocsArtifact = bincode::deserialize(&read_artifact(&paths.docs)?)
        .map_err(|e| RetrievalError::load(format!("cannot decode {}: {e}", paths.docs.display())))?;
    let store = DocumentStore::from_parts(docs.documents, docs.metadata)?;

    if index.len() != store.len() {
        return Err(RetrievalError::load(format!(
            "index has {} rows but store has {} passages",
            index.len(),
            store.len()
        )));
    }

    tracing::info!(
        "Loaded knowledge base from {:?} ({} passages, dimension {})",
        base,
        store.len(),
        index.dimension()
    );
    Ok(Some((index, store)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MetadataValue;
    use crate::index::FlatIndex;
    use tempfile::TempDir;

    fn sample() -> (FlatIndex, DocumentStore) {
        let mut index = FlatIndex::new(3);
        let mut store = DocumentStore::new();
        let rows = [
            ("dry ice", [1.0, 0.0, 0.0], "physics"),
            ("slime", [0.0, 1.0, 0.0], "chemistry"),
        ];
        for (text, v, topic) in rows {
            index.add(&[v.to_vec()]).unwrap();
            let mut m = Metadata::new();
            m.insert("topic".into(), MetadataValue::String(topic.into()));
            store.append(text.into(), m);
        }
        (index, store)
    }

    #[test]
    fn test_artifact_paths_append_suffix() {
        let paths = ArtifactPaths::new(Path::new("/data/kb/faiss_index"));
        assert_eq!(paths.index, PathBuf::from("/data/kb/faiss_index.index"));
        assert_eq!(paths.docs, PathBuf::from("/data/kb/faiss_index.docs"));
        let dotted = ArtifactPaths::new(Path::new("store.v2"));
        assert_eq!(dotted.index, PathBuf::from("store.v2.index"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("nested").join("kb");
        let (index, store) = sample();
        save(&base, &index, &store).unwrap();

        let (loaded_index, loaded_store) = load::<FlatIndex>(&base).unwrap().unwrap();
        assert_eq!(loaded_index, index);
        assert_eq!(loaded_store, store);
        assert!(!with_suffix(&ArtifactPaths::new(&base).index, "tmp").exists());
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load::<FlatIndex>(&dir.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn test_load_lone_artifact_is_error() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("kb");
        let (index, store) = sample();
        save(&base, &index, &store).unwrap();
        fs::remove_file(ArtifactPaths::new(&base).docs).unwrap();
        assert!(matches!(
            load::<FlatIndex>(&base),
            Err(RetrievalError::Load(_))
        ));
    }

    #[test]
    fn test_load_detects_bit_flip() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("kb");
        let (index, store) = sample();
        save(&base, &index, &store).unwrap();

        let docs_path = ArtifactPaths::new(&base).docs;
        let mut bytes = fs::read(&docs_path).unwrap();
        bytes[2] ^= 0xFF;
        fs::write(&docs_path, &bytes).unwrap();
        let err = load::<FlatIndex>(&base).unwrap_err();
        assert!(err.to_string().contains("CRC32 mismatch"), "{err}");
    }

    #[test]
    fn test_load_garbage_is_error() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("kb");
        let paths = ArtifactPaths::new(&base);
        fs::write(&paths.index, b"garbage").unwrap();
        fs::write(&paths.docs, b"").unwrap();
        assert!(matches!(
            load::<FlatIndex>(&base),
            Err(RetrievalError::Load(_))
        ));
    }

    #[test]
    fn test_load_detects_misaligned_pair() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("kb");
        let (mut index, store) = sample();
        save(&base, &index, &store).unwrap();

        // Simulate a crash after the index rename but before the docs rename.
        index.add(&[vec![0.0, 0.0, 1.0]]).unwrap();
        let paths = ArtifactPaths::new(&base);
        write_artifact(&paths.index, &index.to_bytes()).unwrap();

        let err = load::<FlatIndex>(&base).unwrap_err();
        assert!(err.to_string().contains("3 rows but store has 2"), "{err}");
    }

    #[test]
    fn test_save_rejects_misaligned_input() {
        let dir = TempDir::new().unwrap();
        let (index, mut store) = sample();
        store.append("orphan".into(), Metadata::new());
        let base = dir.path().join("kb");
        assert!(matches!(
            save(&base, &index, &store),
            Err(RetrievalError::Index { .. })
        ));
        assert!(!ArtifactPaths::new(&base).index.exists());
    }
}
