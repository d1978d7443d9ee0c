use crate::core::sort::SortOrder;
use crate::domain::ports::{CatalogSource, ConfigProvider};
use crate::utils::error::{Result, SearchError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub cache: CacheConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub r#type: String,
    pub endpoint: Option<String>,
    pub path: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSection {
    pub debounce_ms: Option<u64>,
    pub page_size: Option<usize>,
    pub default_sort: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: Option<usize>,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

pub const MAX_PAGE_SIZE: usize = 500;

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SearchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SearchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CATALOG_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SearchError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        match self.catalog_source()? {
            CatalogSource::Http { endpoint } => {
                validation::validate_url("catalog.endpoint", &endpoint)?
            }
            CatalogSource::File { path } => {
                validation::validate_path("catalog.path", &path)?;
                validation::validate_file_extension("catalog.path", &path, &["json"])?;
            }
        }

        if let Some(timeout) = self.catalog.timeout_seconds {
            validation::validate_range("catalog.timeout_seconds", timeout, 1, 600)?;
        }
        if let Some(page_size) = self.search.page_size {
            validation::validate_range("search.page_size", page_size, 1, MAX_PAGE_SIZE)?;
        }
        if let Some(capacity) = self.cache.capacity {
            validation::validate_positive_number("cache.capacity", capacity, 1)?;
        }
        if let Some(sort) = &self.search.default_sort {
            validation::validate_non_empty_string("search.default_sort", sort)?;
        }

        Ok(())
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.catalog.headers.clone().unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn catalog_source(&self) -> Result<CatalogSource> {
        match self.catalog.r#type.as_str() {
            "http" | "api" => {
                let endpoint = validation::validate_required_field(
                    "catalog.endpoint",
                    &self.catalog.endpoint,
                )?;
                Ok(CatalogSource::Http {
                    endpoint: endpoint.clone(),
                })
            }
            "file" => {
                let path = validation::validate_required_field("catalog.path", &self.catalog.path)?;
                Ok(CatalogSource::File { path: path.clone() })
            }
            other => Err(SearchError::InvalidConfigValueError {
                field: "catalog.type".to_string(),
                value: other.to_string(),
                reason: "Supported catalog types: http, file".to_string(),
            }),
        }
    }

    fn request_timeout(&self) -> Duration {
        self.catalog
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(crate::adapters::http::DEFAULT_TIMEOUT)
    }

    fn page_size(&self) -> usize {
        self.search
            .page_size
            .unwrap_or(crate::core::session::DEFAULT_PAGE_SIZE)
    }

    fn debounce_delay(&self) -> Duration {
        self.search
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(crate::core::session::DEFAULT_DEBOUNCE)
    }

    fn cache_capacity(&self) -> usize {
        self.cache
            .capacity
            .unwrap_or(crate::core::cache::DEFAULT_CAPACITY)
    }

    fn cache_ttl(&self) -> Duration {
        self.cache
            .ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(crate::core::cache::DEFAULT_TTL)
    }

    fn default_sort(&self) -> SortOrder {
        self.search
            .default_sort
            .as_deref()
            .map(SortOrder::from_identifier)
            .unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
