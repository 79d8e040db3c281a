use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// A temporary artifact that is deleted when the value goes out of scope.
///
/// Deletion is best-effort: a failure is logged and never masks the error
/// that is currently propagating.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        remove_if_exists(&self.path);
    }
}

/// Removes a file if present, logging instead of failing. Used wherever
/// cleanup must not shadow the original error.
pub fn remove_if_exists(path: &Path) {
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_artifact_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.gz");
        fs::write(&path, b"payload").unwrap();

        {
            let artifact = TempArtifact::new(path.clone());
            assert!(artifact.path().is_file());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_artifact_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created.gz");
        drop(TempArtifact::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_if_exists_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(dir.path());
        assert!(dir.path().is_dir());
    }
}
