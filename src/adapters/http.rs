use crate::adapters::parse_catalog;
use crate::core::query_string::criteria_pairs;
use crate::domain::model::{Criteria, Property};
use crate::domain::ports::CatalogProvider;
use crate::utils::error::{Result, SearchError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches listings from a JSON HTTP endpoint.
///
/// Criteria travel as query parameters so the backend may pre-filter; the
/// search core filters again either way. No retries happen here.
pub struct HttpCatalogProvider {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
}

impl HttpCatalogProvider {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            headers: HashMap::new(),
        })
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn fetch_properties(&self, criteria: &Criteria) -> Result<Vec<Property>> {
        let params = criteria_pairs(criteria);
        tracing::debug!("Making catalog request to: {} ({} params)", self.endpoint, params.len());

        let mut request = self.client.get(&self.endpoint).query(&params);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Catalog response status: {}", status);

        if !status.is_success() {
            return Err(SearchError::fetch_failure(format!(
                "{} returned HTTP {}",
                self.endpoint, status
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let properties = parse_catalog(json);
        tracing::debug!("Fetched {} properties", properties.len());
        Ok(properties)
    }
}
