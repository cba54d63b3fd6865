//! Directory-backed blob store
//!
//! Each blob is a file under the store's root; blob names map to relative paths.

use super::traits::{normalise_blob_name, BlobStore};
use crate::domain::{DextractError, Result, StorageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A [`BlobStore`] kept in a local directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, blob_name: &str) -> Result<PathBuf> {
        let name = normalise_blob_name(blob_name);
        if name.is_empty() || name.split('/').any(|part| part == "..") {
            return Err(DextractError::Validation(format!(
                "Invalid blob name: {blob_name}"
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn ensure_container(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn list_blobs(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(StorageError::ContainerNotFound(self.location()).into());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| DextractError::Io(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            names.push(super::traits::blob_name_for(entry.path(), &self.root)?);
        }
        Ok(names)
    }

    async fn exists(&self, blob_name: &str) -> Result<bool> {
        Ok(self.blob_path(blob_name)?.is_file())
    }

    async fn upload(&self, path: &Path, blob_name: &str, overwrite: bool) -> Result<()> {
        let target = self.blob_path(blob_name)?;
        if !overwrite && target.exists() {
            return Err(StorageError::BlobAlreadyExists(normalise_blob_name(blob_name)).into());
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(path, &target).await?;
        tracing::debug!(blob = %blob_name, store = %self.location(), "Stored blob");
        Ok(())
    }

    async fn download(&self, blob_name: &str, dest: &Path) -> Result<()> {
        let source = self.blob_path(blob_name)?;
        if !source.is_file() {
            return Err(StorageError::BlobNotFound(normalise_blob_name(blob_name)).into());
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, dest).await?;
        Ok(())
    }

    async fn delete(&self, blob_name: &str) -> Result<()> {
        let target = self.blob_path(blob_name)?;
        if !target.is_file() {
            return Err(StorageError::BlobNotFound(normalise_blob_name(blob_name)).into());
        }
        tokio::fs::remove_file(target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::upload_file;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_list_download_delete() {
        let local = TempDir::new().unwrap();
        let container = TempDir::new().unwrap();
        let store = LocalBlobStore::new(container.path().join("extracts"));
        store.ensure_container().await.unwrap();

        let file = local.path().join("data").join("a.csv");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "x\n1\n").unwrap();

        let name = upload_file(&store, &file, local.path()).await.unwrap();
        assert_eq!(name, "data/a.csv");
        assert_eq!(store.list_blobs().await.unwrap(), vec!["data/a.csv"]);
        assert!(store.exists("data\\a.csv").await.unwrap());

        let dest = local.path().join("copy").join("a.csv");
        store.download("data/a.csv", &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "x\n1\n");

        store.delete("data/a.csv").await.unwrap();
        assert!(!store.exists("data/a.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().join("c"));
        let file = dir.path().join("a.csv");
        std::fs::write(&file, "1").unwrap();

        store.upload(&file, "a.csv", false).await.unwrap();
        let result = store.upload(&file, "a.csv", false).await;
        assert!(matches!(
            result,
            Err(DextractError::Storage(StorageError::BlobAlreadyExists(_)))
        ));
        store.upload(&file, "a.csv", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_blob_and_container() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().join("missing"));

        assert!(matches!(
            store.list_blobs().await,
            Err(DextractError::Storage(StorageError::ContainerNotFound(_)))
        ));
        assert!(matches!(
            store.download("nope.csv", &dir.path().join("x")).await,
            Err(DextractError::Storage(StorageError::BlobNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().join("c"));
        let result = upload_file(&store, &dir.path().join("nope.csv"), dir.path()).await;
        assert!(matches!(result, Err(DextractError::Io(_))));
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        assert!(store.exists("../etc/passwd").await.is_err());
    }
}
