use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 房源記錄，由 catalog provider 提供，核心只讀不寫
///
/// Numeric fields are optional: a record whose price or counts are missing or
/// non-numeric still loads, it just never satisfies a bound on that field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(deserialize_with = "de::identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub title: String,
    #[serde(default, deserialize_with = "de::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de::text", alias = "location")]
    pub address: String,
    #[serde(default, deserialize_with = "de::count")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "de::count")]
    pub bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "de::text", alias = "type")]
    pub property_type: String,
    #[serde(default, deserialize_with = "de::number", alias = "squareFeet")]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "de::tags")]
    pub amenities: BTreeSet<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "de::count")]
    pub days_on_market: Option<u32>,
    #[serde(default, deserialize_with = "de::text")]
    pub description: String,
}

impl Property {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            price: None,
            address: String::new(),
            bedrooms: None,
            bathrooms: None,
            property_type: String::new(),
            area: None,
            amenities: BTreeSet::new(),
            latitude: None,
            longitude: None,
            days_on_market: None,
            description: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_bedrooms(mut self, bedrooms: u32) -> Self {
        self.bedrooms = Some(bedrooms);
        self
    }

    pub fn with_bathrooms(mut self, bathrooms: u32) -> Self {
        self.bathrooms = Some(bathrooms);
        self
    }

    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = property_type.into();
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = amenities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_days_on_market(mut self, days: u32) -> Self {
        self.days_on_market = Some(days);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 有效的價格 (NaN / 無限值視為缺失)
    pub fn valid_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite())
    }

    pub fn valid_area(&self) -> Option<f64> {
        self.area.filter(|a| a.is_finite())
    }
}

/// 搜尋條件。每個欄位都是明確的 Option，`None` 代表不限制
///
/// `amenities` is a sorted set so two logically equal criteria always
/// serialize the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<PriceBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<PriceBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bathrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub amenities: BTreeSet<String>,
}

/// 價格上下限：必定是有限數值，`-0.0` 正規化為 `0.0`
///
/// Equality and hashing go through the bit pattern, which is sound once NaN
/// and negative zero are ruled out, so [`Criteria`] keeps `Eq` and `Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PriceBound(f64);

impl PriceBound {
    /// `None` for NaN or infinite values.
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Eq for PriceBound {}

impl Hash for PriceBound {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for PriceBound {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PriceBound::new(value).ok_or_else(|| format!("price bound must be finite, got {}", value))
    }
}

impl From<PriceBound> for f64 {
    fn from(bound: PriceBound) -> Self {
        bound.0
    }
}

impl fmt::Display for PriceBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Property-type values that mean "no restriction".
pub const ANY_PROPERTY_TYPE: [&str; 2] = ["any", "all"];

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    /// Non-finite values leave the bound unset.
    pub fn with_min_price(mut self, min_price: f64) -> Self {
        self.min_price = PriceBound::new(min_price);
        self
    }

    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = PriceBound::new(max_price);
        self
    }

    pub fn with_min_bedrooms(mut self, min_bedrooms: u32) -> Self {
        self.min_bedrooms = Some(min_bedrooms);
        self
    }

    pub fn with_min_bathrooms(mut self, min_bathrooms: u32) -> Self {
        self.min_bathrooms = Some(min_bathrooms);
        self
    }

    pub fn with_amenity(mut self, amenity: impl Into<String>) -> Self {
        self.amenities.insert(amenity.into());
        self
    }

    /// 正規化：去除前後空白，空字串與 "any"/"all" 視為未設定
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let property_type = clean(self.property_type).filter(|t| {
            !ANY_PROPERTY_TYPE
                .iter()
                .any(|sentinel| t.eq_ignore_ascii_case(sentinel))
        });

        Self {
            query: clean(self.query),
            location: clean(self.location),
            property_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
            min_bathrooms: self.min_bathrooms,
            amenities: self
                .amenities
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// 所有欄位都未設定
    pub fn is_unconstrained(&self) -> bool {
        *self == Criteria::default()
    }
}

/// 分頁結果，每次 controller 週期重新計算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Property>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl Page {
    pub fn empty(page_number: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page_number,
            page_size,
            total_items: 0,
            total_pages: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }
}

mod de {
    use super::*;
    use serde_json::Value;

    pub fn identifier<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "property id must be a string or number, got {}",
                other
            ))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let parsed = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(parsed.filter(|v| v.is_finite()))
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let parsed = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Ok(parsed.and_then(|v| u32::try_from(v).ok()))
    }

    pub fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
            _ => BTreeSet::new(),
        })
    }
}
