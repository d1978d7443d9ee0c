use crate::core::sort::SortOrder;
use crate::domain::model::{Criteria, Property};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 房源資料來源。可能很慢，也可能失敗；重試策略屬於 provider 自己
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_properties(&self, criteria: &Criteria) -> Result<Vec<Property>>;
}

/// Where the catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Http { endpoint: String },
    File { path: String },
}

pub trait ConfigProvider: Send + Sync {
    fn catalog_source(&self) -> Result<CatalogSource>;
    fn request_timeout(&self) -> Duration;
    fn page_size(&self) -> usize;
    fn debounce_delay(&self) -> Duration;
    fn cache_capacity(&self) -> usize;
    fn cache_ttl(&self) -> Duration;
    fn default_sort(&self) -> SortOrder;
}
