use crate::core::controller::SearchView;
use crate::domain::model::{Page, Property};
use crate::utils::error::{Result, SearchError};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(SearchError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Valid formats: table, json, csv".to_string(),
            }),
        }
    }
}

pub fn render_view(view: &SearchView, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
        OutputFormat::Csv => render_csv(&view.page),
        OutputFormat::Table => Ok(render_table(view)),
    }
}

const CSV_HEADER: [&str; 10] = [
    "id",
    "title",
    "price",
    "address",
    "bedrooms",
    "bathrooms",
    "propertyType",
    "area",
    "amenities",
    "daysOnMarket",
];

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_row(property: &Property) -> [String; 10] {
    [
        property.id.clone(),
        property.title.clone(),
        optional(property.valid_price()),
        property.address.clone(),
        optional(property.bedrooms),
        optional(property.bathrooms),
        property.property_type.clone(),
        optional(property.valid_area()),
        property
            .amenities
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";"),
        optional(property.days_on_market),
    ]
}

pub fn render_csv(page: &Page) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for property in &page.items {
        writer.write_record(csv_row(property))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SearchError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render_table(view: &SearchView) -> String {
    let page = &view.page;
    let mut out = String::new();

    if let Some(error) = &view.error {
        let _ = writeln!(out, "❌ {}", error);
    }
    let _ = writeln!(
        out,
        "Page {}/{} · {} matching listings · sort: {}{}",
        page.page_number,
        page.total_pages.max(1),
        page.total_items,
        view.sort,
        if view.from_cache { " (cached)" } else { "" }
    );

    for property in &page.items {
        let price = property
            .valid_price()
            .map(|p| format!("${:.0}", p))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "  [{}] {} | {} | {} bd / {} ba | {}",
            property.id,
            if property.title.is_empty() { "(untitled)" } else { property.title.as_str() },
            price,
            optional(property.bedrooms),
            optional(property.bathrooms),
            property.address
        );
    }

    out
}
