use super::{Container, ObjectStore};
use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps each container as a sub-directory of `root`.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn object_path(&self, container: Container, path: &str) -> PathBuf {
        self.root.join(container.name()).join(path)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn get(&self, container: Container, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.object_path(container, path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, container: Container, path: &str, body: Vec<u8>) -> Result<()> {
        let full = self.object_path(container, path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write then rename so a reader never sees a half-written object.
        let tmp = full.with_extension("partial");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &full).await?;

        debug!(path = %full.display(), bytes = body.len(), "Object written");
        Ok(())
    }
}
