#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::adapters::file::FileCatalogProvider;
use crate::adapters::http::HttpCatalogProvider;
use crate::domain::ports::{CatalogProvider, CatalogSource, ConfigProvider};
use crate::utils::error::Result;
use std::sync::Arc;

/// 依設定建立 catalog provider
pub fn build_provider<C: ConfigProvider + ?Sized>(
    config: &C,
    headers: std::collections::HashMap<String, String>,
) -> Result<Arc<dyn CatalogProvider>> {
    match config.catalog_source()? {
        CatalogSource::Http { endpoint } => {
            tracing::debug!("Using HTTP catalog at {}", endpoint);
            let provider = HttpCatalogProvider::with_timeout(endpoint, config.request_timeout())?
                .with_headers(headers);
            Ok(Arc::new(provider))
        }
        CatalogSource::File { path } => {
            tracing::debug!("Using catalog file {}", path);
            Ok(Arc::new(FileCatalogProvider::from_path(&path)))
        }
    }
}
