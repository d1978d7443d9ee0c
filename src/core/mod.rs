pub mod cache;
pub mod controller;
pub mod debounce;
pub mod filter;
pub mod pagination;
pub mod query_string;
pub mod session;
pub mod sort;

pub use crate::domain::model::{Criteria, Page, PriceBound, Property};
pub use crate::domain::ports::{CatalogProvider, ConfigProvider, Storage};
pub use crate::utils::error::Result;
