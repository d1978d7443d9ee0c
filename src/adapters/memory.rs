use crate::domain::model::{Criteria, Property};
use crate::domain::ports::CatalogProvider;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process catalog snapshot.
///
/// Every mutation bumps [`revision`](Self::revision); whoever owns a result
/// cache over this catalog must invalidate it when the revision moves.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    properties: Arc<RwLock<Vec<Property>>>,
    revision: Arc<AtomicU64>,
}

impl InMemoryCatalog {
    pub fn new(properties: Vec<Property>) -> Self {
        Self {
            properties: Arc::new(RwLock::new(properties)),
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.properties.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.properties.read().await.is_empty()
    }

    pub async fn replace(&self, properties: Vec<Property>) {
        *self.properties.write().await = properties;
        self.bump();
    }

    /// 依 id 更新，不存在就附加到尾端
    pub async fn upsert(&self, property: Property) {
        let mut properties = self.properties.write().await;
        match properties.iter_mut().find(|p| p.id == property.id) {
            Some(existing) => *existing = property,
            None => properties.push(property),
        }
        drop(properties);
        self.bump();
    }

    pub async fn remove(&self, id: &str) -> Option<Property> {
        let mut properties = self.properties.write().await;
        let index = properties.iter().position(|p| p.id == id)?;
        let removed = properties.remove(index);
        drop(properties);
        self.bump();
        Some(removed)
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn fetch_properties(&self, _criteria: &Criteria) -> Result<Vec<Property>> {
        Ok(self.properties.read().await.clone())
    }
}
