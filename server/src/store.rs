use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dcprov_protocol::ArtifactKind;

use crate::error::Result;

/// On-disk artifact store: one fixed directory holding `cert.pem`,
/// `key.pem`, `dc.cred` and `dckey.pem`.
///
/// An artifact is present only when its file exists and is non-empty;
/// a partial or failed write never counts as present.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the directory if absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of one artifact file.
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Read one artifact; `None` when the file is absent or empty.
    pub fn read(&self, kind: ArtifactKind) -> Option<Vec<u8>> {
        match fs::read(self.path(kind)) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            _ => None,
        }
    }

    /// Overwrite one artifact. Regeneration replaces bundle entries
    /// wholesale; there is no append path.
    pub fn write(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<()> {
        fs::write(self.path(kind), bytes)?;
        Ok(())
    }

    /// Read every present artifact.
    pub fn read_bundle(&self) -> HashMap<ArtifactKind, Vec<u8>> {
        ArtifactKind::ALL
            .iter()
            .filter_map(|kind| self.read(*kind).map(|bytes| (*kind, bytes)))
            .collect()
    }

    /// File names of the artifacts currently absent.
    pub fn missing(&self) -> Vec<String> {
        ArtifactKind::ALL
            .iter()
            .filter(|kind| self.read(**kind).is_none())
            .map(|kind| kind.file_name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_not_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        store.write(ArtifactKind::DcCred, b"credential").unwrap();
        store.write(ArtifactKind::DcKey, b"").unwrap();

        assert_eq!(store.read(ArtifactKind::DcCred).unwrap(), b"credential");
        assert!(store.read(ArtifactKind::DcKey).is_none());
        assert_eq!(
            store.missing(),
            vec!["cert.pem", "key.pem", "dckey.pem"]
        );
    }

    #[test]
    fn bundle_reads_only_present_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        store.write(ArtifactKind::Cert, b"cert").unwrap();
        store.write(ArtifactKind::Key, b"key").unwrap();

        let bundle = store.read_bundle();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle[&ArtifactKind::Cert], b"cert");
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("certs");
        let store = ArtifactStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.missing().len(), 4);
    }
}
