use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::error::SubmitError;

/// Directory that receives the generated submission files.
#[derive(Debug, Clone)]
pub struct SubmissionStore {
    root: Utf8PathBuf,
}

impl SubmissionStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn path_for(&self, file_name: &str) -> Utf8PathBuf {
        self.root.join(file_name)
    }

    pub fn ensure_root(&self) -> Result<(), SubmitError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| SubmitError::Filesystem(err.to_string()))
    }

    /// Write `content` to `file_name` under the root. The file only appears
    /// once fully written.
    pub fn write_file(&self, file_name: &str, content: &[u8]) -> Result<Utf8PathBuf, SubmitError> {
        let path = self.path_for(file_name);
        Self::write_bytes_atomic(&path, content)?;
        tracing::debug!("wrote {path} ({} bytes)", content.len());
        Ok(path)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), SubmitError> {
        let parent = path
            .parent()
            .ok_or_else(|| SubmitError::Filesystem("invalid destination path".to_string()))?;
        let parent = if parent.as_str().is_empty() {
            Utf8Path::new(".")
        } else {
            parent
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| SubmitError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("bpa-submit")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| SubmitError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| SubmitError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| SubmitError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_replaces_existing_content() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();
        let store = SubmissionStore::new(root);
        store.ensure_root().unwrap();

        store.write_file("a.tsv", b"first").unwrap();
        let path = store.write_file("a.tsv", b"second").unwrap();

        assert!(path.ends_with("out/a.tsv"));
        assert_eq!(std::fs::read(path.as_std_path()).unwrap(), b"second");
    }
}
