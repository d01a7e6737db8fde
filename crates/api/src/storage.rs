//! Local filesystem store for uploaded client documents.
//!
//! Files live under a single root directory, addressed by relative keys of the
//! form `{client_id}/{doc_id}-{timestamp}.{ext}`.

use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Key of a path previously returned by [`put`](Self::put).
    pub fn key_of(&self, path: &Path) -> io::Result<String> {
        path.strip_prefix(&self.root)
            .ok()
            .and_then(|rel| rel.to_str())
            .map(|rel| rel.replace(std::path::MAIN_SEPARATOR, "/"))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{}' is outside the document store", path.display()),
                )
            })
    }

    /// Absolute-or-root-relative path a key resolves to.
    ///
    /// Rejects empty keys, absolute paths and any `..` or `.` component so
    /// a key can never leave the root.
    pub fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        let rel = Path::new(key);
        let valid = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key '{key}'"),
            ));
        }
        Ok(self.root.join(rel))
    }

    /// Write `bytes` under `key`, creating parent directories as needed.
    /// Returns the path written.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored document");
        Ok(path)
    }

    pub async fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(key)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_keys_outside_root() {
        let store = DocumentStore::new("/srv/docs");
        for key in ["", "../etc/passwd", "/etc/passwd", "1/../../x.pdf", "./1/a.pdf"] {
            assert!(store.resolve(key).is_err(), "{key}");
        }
        assert_eq!(
            store.resolve("12/w2-1700000000000.pdf").unwrap(),
            PathBuf::from("/srv/docs/12/w2-1700000000000.pdf")
        );
    }

    #[tokio::test]
    async fn stored_path_maps_back_to_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let path = store.put("3/poa-5.pdf", b"%PDF").await.unwrap();

        assert_eq!(store.key_of(&path).unwrap(), "3/poa-5.pdf");
        assert!(store.key_of(Path::new("/elsewhere/3/poa-5.pdf")).is_err());
    }

    #[tokio::test]
    async fn put_creates_client_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let path = store.put("7/w2-1.pdf", b"%PDF-1.4").await.unwrap();

        assert!(path.starts_with(dir.path().join("7")));
        assert_eq!(store.get("7/w2-1.pdf").await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        store.put("1/a.pdf", b"one").await.unwrap();
        store.put("1/a.pdf", b"two").await.unwrap();

        assert_eq!(store.get("1/a.pdf").await.unwrap(), b"two");
    }
}
