use crate::domain::model::Property;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type Comparator = fn(&Property, &Property) -> Ordering;

/// 排序方式。未知的識別字一律視為 relevance (不重新排序)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Relevance,
    PriceAscending,
    PriceDescending,
    /// Ascending days on market.
    Newest,
    Oldest,
    /// Largest floor area first.
    Size,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::Relevance,
        SortOrder::PriceAscending,
        SortOrder::PriceDescending,
        SortOrder::Newest,
        SortOrder::Oldest,
        SortOrder::Size,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::PriceAscending => "price-ascending",
            SortOrder::PriceDescending => "price-descending",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Size => "size",
        }
    }

    /// 寬鬆解析，無法辨識時回傳 Relevance
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "price-ascending" | "price-asc" | "price_asc" | "price-low" => SortOrder::PriceAscending,
            "price-descending" | "price-desc" | "price_desc" | "price-high" => {
                SortOrder::PriceDescending
            }
            "newest" => SortOrder::Newest,
            "oldest" => SortOrder::Oldest,
            "size" | "largest" => SortOrder::Size,
            _ => SortOrder::Relevance,
        }
    }

    /// `None` means keep input order.
    pub fn comparator(&self) -> Option<Comparator> {
        match self {
            SortOrder::Relevance => None,
            SortOrder::PriceAscending => Some(by_price_ascending),
            SortOrder::PriceDescending => Some(by_price_descending),
            SortOrder::Newest => Some(by_newest),
            SortOrder::Oldest => Some(by_oldest),
            SortOrder::Size => Some(by_size_descending),
        }
    }

    /// Stable sort in place; equal keys keep their input order.
    pub fn sort(&self, properties: &mut [Property]) {
        if let Some(compare) = self.comparator() {
            properties.sort_by(compare);
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortOrder::from_identifier(s))
    }
}

// Missing keys sort after present ones in both directions.
fn missing_last<T>(a: Option<T>, b: Option<T>, present: impl Fn(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => present(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_price_ascending(a: &Property, b: &Property) -> Ordering {
    missing_last(a.valid_price(), b.valid_price(), |a, b| a.total_cmp(&b))
}

fn by_price_descending(a: &Property, b: &Property) -> Ordering {
    missing_last(a.valid_price(), b.valid_price(), |a, b| b.total_cmp(&a))
}

fn by_newest(a: &Property, b: &Property) -> Ordering {
    missing_last(a.days_on_market, b.days_on_market, |a, b| a.cmp(&b))
}

fn by_oldest(a: &Property, b: &Property) -> Ordering {
    missing_last(a.days_on_market, b.days_on_market, |a, b| b.cmp(&a))
}

fn by_size_descending(a: &Property, b: &Property) -> Ordering {
    missing_last(a.valid_area(), b.valid_area(), |a, b| b.total_cmp(&a))
}
