//! Shareable URL encoding of the search state.
//!
//! Each populated criteria field becomes one query parameter; `amenities` is a
//! JSON-encoded array under a single parameter. `page` and `sort` ride along
//! when present.

use crate::core::sort::SortOrder;
use crate::domain::model::{Criteria, PriceBound};
use crate::utils::error::{Result, SearchError};
use std::collections::BTreeSet;
use std::str::FromStr;
use url::form_urlencoded;

pub const QUERY: &str = "query";
pub const LOCATION: &str = "location";
pub const PROPERTY_TYPE: &str = "propertyType";
pub const MIN_PRICE: &str = "minPrice";
pub const MAX_PRICE: &str = "maxPrice";
pub const MIN_BEDROOMS: &str = "minBedrooms";
pub const MIN_BATHROOMS: &str = "minBathrooms";
pub const AMENITIES: &str = "amenities";
pub const PAGE: &str = "page";
pub const SORT: &str = "sort";

/// 完整的可分享搜尋狀態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub criteria: Criteria,
    pub page: Option<usize>,
    pub sort: Option<SortOrder>,
}

/// Criteria as `(name, value)` pairs in a fixed order.
pub fn criteria_pairs(criteria: &Criteria) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();

    if let Some(query) = &criteria.query {
        pairs.push((QUERY, query.clone()));
    }
    if let Some(location) = &criteria.location {
        pairs.push((LOCATION, location.clone()));
    }
    if let Some(property_type) = &criteria.property_type {
        pairs.push((PROPERTY_TYPE, property_type.clone()));
    }
    if let Some(min) = criteria.min_price {
        pairs.push((MIN_PRICE, min.to_string()));
    }
    if let Some(max) = criteria.max_price {
        pairs.push((MAX_PRICE, max.to_string()));
    }
    if let Some(min) = criteria.min_bedrooms {
        pairs.push((MIN_BEDROOMS, min.to_string()));
    }
    if let Some(min) = criteria.min_bathrooms {
        pairs.push((MIN_BATHROOMS, min.to_string()));
    }
    if !criteria.amenities.is_empty() {
        // a Vec<&String> of a BTreeSet always serializes
        let encoded = serde_json::to_string(&criteria.amenities.iter().collect::<Vec<_>>())
            .unwrap_or_else(|_| "[]".to_string());
        pairs.push((AMENITIES, encoded));
    }

    pairs
}

pub fn to_query_string(criteria: &Criteria) -> String {
    encode_pairs(criteria_pairs(criteria))
}

pub fn params_to_query_string(params: &SearchParams) -> String {
    let mut pairs = criteria_pairs(&params.criteria);
    if let Some(page) = params.page {
        pairs.push((PAGE, page.to_string()));
    }
    if let Some(sort) = params.sort {
        pairs.push((SORT, sort.as_str().to_string()));
    }
    encode_pairs(pairs)
}

fn encode_pairs(pairs: Vec<(&'static str, String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in &pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

pub fn from_query_string(input: &str) -> Result<Criteria> {
    Ok(parse_params(input)?.criteria)
}

/// 解析查詢字串。未知參數忽略，空值視為未設定
pub fn parse_params(input: &str) -> Result<SearchParams> {
    let input = input.strip_prefix('?').unwrap_or(input);
    let mut params = SearchParams::default();

    for (name, value) in form_urlencoded::parse(input.as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        let criteria = &mut params.criteria;
        match name.as_ref() {
            QUERY => criteria.query = Some(value.to_string()),
            LOCATION => criteria.location = Some(value.to_string()),
            PROPERTY_TYPE => criteria.property_type = Some(value.to_string()),
            MIN_PRICE => criteria.min_price = Some(parse_price(MIN_PRICE, value)?),
            MAX_PRICE => criteria.max_price = Some(parse_price(MAX_PRICE, value)?),
            MIN_BEDROOMS => criteria.min_bedrooms = Some(parse_number(MIN_BEDROOMS, value)?),
            MIN_BATHROOMS => criteria.min_bathrooms = Some(parse_number(MIN_BATHROOMS, value)?),
            AMENITIES => criteria.amenities = parse_amenities(value)?,
            PAGE => params.page = Some(parse_number(PAGE, value)?),
            SORT => params.sort = Some(SortOrder::from_identifier(value)),
            other => tracing::debug!(parameter = other, "Ignoring unknown query parameter"),
        }
    }

    Ok(params)
}

fn parse_number<T>(parameter: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| SearchError::InvalidQueryParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_price(parameter: &str, value: &str) -> Result<PriceBound> {
    let number: f64 = parse_number(parameter, value)?;
    PriceBound::new(number).ok_or_else(|| SearchError::InvalidQueryParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: "price must be a finite number".to_string(),
    })
}

fn parse_amenities(value: &str) -> Result<BTreeSet<String>> {
    serde_json::from_str::<Vec<String>>(value)
        .map(|tags| tags.into_iter().collect())
        .map_err(|e| SearchError::InvalidQueryParameter {
            parameter: AMENITIES.to_string(),
            value: value.to_string(),
            reason: format!("expected a JSON array of strings: {}", e),
        })
}
