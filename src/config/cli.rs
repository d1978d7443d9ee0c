use crate::config::toml_config::{TomlConfig, MAX_PAGE_SIZE};
use crate::core::query_string::{self, SearchParams};
use crate::core::sort::SortOrder;
use crate::domain::model::{Criteria, PriceBound};
use crate::domain::ports::{CatalogSource, ConfigProvider};
use crate::utils::error::{Result, SearchError};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "listing-search")]
#[command(about = "Filter, sort and paginate a property listing catalog")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// HTTP catalog endpoint (overrides the config file)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// JSON catalog file (overrides the config file)
    #[arg(long)]
    pub catalog_file: Option<String>,

    /// Full search state as a URL query string, e.g. "minPrice=300000&sort=newest"
    #[arg(long)]
    pub query_string: Option<String>,

    /// Free-text keyword matched against title, address and description
    #[arg(short, long)]
    pub query: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub property_type: Option<String>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    #[arg(long)]
    pub min_bedrooms: Option<u32>,

    #[arg(long)]
    pub min_bathrooms: Option<u32>,

    /// Required amenity, repeatable
    #[arg(long = "amenity")]
    pub amenities: Vec<String>,

    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub page_size: Option<usize>,

    /// relevance, price-ascending, price-descending, newest, oldest, size
    #[arg(long)]
    pub sort: Option<String>,

    /// Output format: table, json or csv
    #[arg(long, default_value = "table")]
    pub format: String,

    #[arg(long, default_value = "300")]
    pub debounce_ms: u64,

    #[arg(long, default_value = "50")]
    pub cache_capacity: usize,

    #[arg(long, default_value = "300")]
    pub cache_ttl_seconds: u64,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Show the resolved search without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 查詢字串為基礎，個別參數覆蓋
    pub fn search_params(&self) -> Result<SearchParams> {
        let mut params = match &self.query_string {
            Some(qs) => query_string::parse_params(qs)?,
            None => SearchParams::default(),
        };

        let criteria = &mut params.criteria;
        if let Some(query) = &self.query {
            criteria.query = Some(query.clone());
        }
        if let Some(location) = &self.location {
            criteria.location = Some(location.clone());
        }
        if let Some(property_type) = &self.property_type {
            criteria.property_type = Some(property_type.clone());
        }
        if let Some(min) = self.min_price {
            criteria.min_price = Some(price_bound("min_price", min)?);
        }
        if let Some(max) = self.max_price {
            criteria.max_price = Some(price_bound("max_price", max)?);
        }
        if self.min_bedrooms.is_some() {
            criteria.min_bedrooms = self.min_bedrooms;
        }
        if self.min_bathrooms.is_some() {
            criteria.min_bathrooms = self.min_bathrooms;
        }
        criteria.amenities.extend(self.amenities.iter().cloned());

        if self.page.is_some() {
            params.page = self.page;
        }
        if let Some(sort) = &self.sort {
            params.sort = Some(SortOrder::from_identifier(sort));
        }

        params.criteria = params.criteria.normalized();
        Ok(params)
    }

    pub fn criteria(&self) -> Result<Criteria> {
        Ok(self.search_params()?.criteria)
    }

    /// 命令列參數覆蓋 TOML 設定
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.catalog.r#type = "http".to_string();
            config.catalog.endpoint = Some(endpoint.clone());
        } else if let Some(path) = &self.catalog_file {
            config.catalog.r#type = "file".to_string();
            config.catalog.path = Some(path.clone());
        }
        if let Some(page_size) = self.page_size {
            config.search.page_size = Some(page_size);
        }
        if let Some(sort) = &self.sort {
            config.search.default_sort = Some(sort.clone());
        }
    }
}

fn price_bound(field: &str, value: f64) -> Result<PriceBound> {
    PriceBound::new(value).ok_or_else(|| SearchError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: "Price must be a finite number".to_string(),
    })
}

impl ConfigProvider for CliConfig {
    fn catalog_source(&self) -> Result<CatalogSource> {
        match (&self.endpoint, &self.catalog_file) {
            (Some(endpoint), _) => Ok(CatalogSource::Http {
                endpoint: endpoint.clone(),
            }),
            (None, Some(path)) => Ok(CatalogSource::File { path: path.clone() }),
            (None, None) => Err(SearchError::MissingConfigError {
                field: "--endpoint or --catalog-file".to_string(),
            }),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn page_size(&self) -> usize {
        self.page_size
            .unwrap_or(crate::core::session::DEFAULT_PAGE_SIZE)
    }

    fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    fn default_sort(&self) -> SortOrder {
        self.sort
            .as_deref()
            .map(SortOrder::from_identifier)
            .unwrap_or_default()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match self.catalog_source()? {
            CatalogSource::Http { endpoint } => validation::validate_url("endpoint", &endpoint)?,
            CatalogSource::File { path } => {
                validation::validate_path("catalog_file", &path)?;
                validation::validate_file_extension("catalog_file", &path, &["json"])?;
            }
        }
        validation::validate_range("page_size", self.page_size(), 1, MAX_PAGE_SIZE)?;
        validation::validate_positive_number("cache_capacity", self.cache_capacity, 1)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 600)?;
        Ok(())
    }
}
