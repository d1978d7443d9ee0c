pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{file::FileCatalogProvider, http::HttpCatalogProvider, memory::InMemoryCatalog};
pub use config::TomlConfig;
pub use crate::core::controller::{SearchController, SearchState, SearchView};
pub use crate::core::session::{SearchHandle, SearchSession, SearchSettings};
pub use crate::core::sort::SortOrder;
pub use domain::model::{Criteria, Page, PriceBound, Property};
pub use utils::error::{Result, SearchError};
