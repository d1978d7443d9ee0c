use crate::adapters::parse_catalog;
use crate::domain::model::{Criteria, Property};
use crate::domain::ports::{CatalogProvider, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// 從 JSON 檔讀取 catalog，每次 fetch 都重新讀檔
pub struct FileCatalogProvider<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> FileCatalogProvider<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }
}

impl FileCatalogProvider<LocalStorage> {
    /// Splits `path` into a storage root and file name.
    pub fn from_path(path: &str) -> Self {
        let full = Path::new(path);
        let base = full
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());
        let file = full
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());
        Self::new(LocalStorage::new(base), file)
    }
}

#[async_trait]
impl<S: Storage> CatalogProvider for FileCatalogProvider<S> {
    async fn fetch_properties(&self, _criteria: &Criteria) -> Result<Vec<Property>> {
        tracing::debug!("Reading catalog file: {}", self.path);
        let bytes = self.storage.read_file(&self.path).await?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok(parse_catalog(json))
    }
}
