use crate::domain::model::{Criteria, Property};

/// 單一條件。每個已設定的 Criteria 欄位產生一個
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Substring of title, address or description.
    Text(String),
    /// Substring of address only.
    Location(String),
    PropertyType(String),
    MinPrice(f64),
    MaxPrice(f64),
    MinBedrooms(u32),
    MinBathrooms(u32),
    /// Every tag must be present.
    Amenities(Vec<String>),
}

impl Constraint {
    pub fn matches(&self, property: &Property) -> bool {
        match self {
            Constraint::Text(needle) => {
                contains_ignore_case(&property.title, needle)
                    || contains_ignore_case(&property.address, needle)
                    || contains_ignore_case(&property.description, needle)
            }
            Constraint::Location(needle) => contains_ignore_case(&property.address, needle),
            Constraint::PropertyType(wanted) => property.property_type.to_lowercase() == *wanted,
            Constraint::MinPrice(min) => property.valid_price().is_some_and(|p| p >= *min),
            Constraint::MaxPrice(max) => property.valid_price().is_some_and(|p| p <= *max),
            Constraint::MinBedrooms(min) => property.bedrooms.is_some_and(|b| b >= *min),
            Constraint::MinBathrooms(min) => property.bathrooms.is_some_and(|b| b >= *min),
            Constraint::Amenities(required) => required.iter().all(|wanted| {
                property
                    .amenities
                    .iter()
                    .any(|have| have.to_lowercase() == *wanted)
            }),
        }
    }
}

// needle is already lowercased
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Conjunction of the constraints derived from one [`Criteria`].
///
/// An empty filter matches everything. Malformed records never cause a panic;
/// they simply fail whichever numeric bounds they cannot satisfy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    constraints: Vec<Constraint>,
}

impl PropertyFilter {
    pub fn from_criteria(criteria: &Criteria) -> Self {
        let criteria = criteria.clone().normalized();
        let mut constraints = Vec::new();

        if let Some(query) = &criteria.query {
            constraints.push(Constraint::Text(query.to_lowercase()));
        }
        if let Some(location) = &criteria.location {
            constraints.push(Constraint::Location(location.to_lowercase()));
        }
        if let Some(property_type) = &criteria.property_type {
            constraints.push(Constraint::PropertyType(property_type.to_lowercase()));
        }
        if let Some(min) = criteria.min_price {
            constraints.push(Constraint::MinPrice(min.get()));
        }
        if let Some(max) = criteria.max_price {
            constraints.push(Constraint::MaxPrice(max.get()));
        }
        if let Some(min) = criteria.min_bedrooms {
            constraints.push(Constraint::MinBedrooms(min));
        }
        if let Some(min) = criteria.min_bathrooms {
            constraints.push(Constraint::MinBathrooms(min));
        }
        if !criteria.amenities.is_empty() {
            constraints.push(Constraint::Amenities(
                criteria.amenities.iter().map(|a| a.to_lowercase()).collect(),
            ));
        }

        Self { constraints }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn matches(&self, property: &Property) -> bool {
        self.constraints.iter().all(|c| c.matches(property))
    }

    /// 保留輸入順序
    pub fn apply<'a, I>(&self, properties: I) -> Vec<Property>
    where
        I: IntoIterator<Item = &'a Property>,
    {
        properties
            .into_iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Property> {
        vec![
            Property::new("1")
                .with_title("Sunny bungalow")
                .with_address("12 Oak St, Austin TX")
                .with_price(200_000.0)
                .with_bedrooms(2)
                .with_bathrooms(1)
                .with_property_type("House")
                .with_amenities(["pool"]),
            Property::new("2")
                .with_title("Downtown condo")
                .with_address("400 Main St, Denver CO")
                .with_price(450_000.0)
                .with_bedrooms(3)
                .with_bathrooms(2)
                .with_property_type("condo")
                .with_amenities(["pool", "gym"])
                .with_description("Walk to the Austin-themed bakery"),
            Property::new("3")
                .with_title("Fixer upper")
                .with_address("9 Elm Rd, Boise ID")
                .with_property_type("house"),
        ]
    }

    fn ids(properties: &[Property]) -> Vec<&str> {
        properties.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_unconstrained_criteria_match_everything() {
        let filter = PropertyFilter::from_criteria(&Criteria::default());
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&catalog()).len(), 3);
    }

    #[test]
    fn test_query_matches_title_address_or_description() {
        let filter = PropertyFilter::from_criteria(&Criteria::new().with_query("AUSTIN"));
        assert_eq!(ids(&filter.apply(&catalog())), vec!["1", "2"]);
    }

    #[test]
    fn test_location_only_checks_address() {
        let filter = PropertyFilter::from_criteria(&Criteria::new().with_location("austin"));
        assert_eq!(ids(&filter.apply(&catalog())), vec!["1"]);
    }

    #[test]
    fn test_property_type_is_case_insensitive_and_any_is_ignored() {
        let house = PropertyFilter::from_criteria(&Criteria::new().with_property_type("HOUSE"));
        assert_eq!(ids(&house.apply(&catalog())), vec!["1", "3"]);

        let any = PropertyFilter::from_criteria(&Criteria::new().with_property_type("all"));
        assert!(any.is_empty());
    }

    #[test]
    fn test_price_bounds_are_inclusive_and_missing_price_fails() {
        let filter = PropertyFilter::from_criteria(
            &Criteria::new().with_min_price(200_000.0).with_max_price(450_000.0),
        );
        assert_eq!(ids(&filter.apply(&catalog())), vec!["1", "2"]);

        let zero = PropertyFilter::from_criteria(&Criteria::new().with_min_price(0.0));
        assert_eq!(ids(&zero.apply(&catalog())), vec!["1", "2"]);
    }

    #[test]
    fn test_fractional_price_bounds() {
        let listing = Property::new("f").with_price(250_000.5);

        let at = PropertyFilter::from_criteria(
            &Criteria::new().with_min_price(250_000.5).with_max_price(250_000.5),
        );
        assert!(at.matches(&listing));

        let above = PropertyFilter::from_criteria(&Criteria::new().with_min_price(250_000.75));
        assert!(!above.matches(&listing));
    }

    #[test]
    fn test_nan_price_fails_bounds() {
        let broken = Property::new("nan").with_price(f64::NAN);
        let filter = PropertyFilter::from_criteria(&Criteria::new().with_max_price(1_000_000.0));
        assert!(!filter.matches(&broken));
    }

    #[test]
    fn test_room_counts_are_thresholds() {
        let filter = PropertyFilter::from_criteria(
            &Criteria::new().with_min_bedrooms(2).with_min_bathrooms(2),
        );
        assert_eq!(ids(&filter.apply(&catalog())), vec!["2"]);
    }

    #[test]
    fn test_amenities_require_all_tags() {
        let filter = PropertyFilter::from_criteria(
            &Criteria::new().with_amenity("pool").with_amenity("GYM"),
        );
        assert_eq!(ids(&filter.apply(&catalog())), vec!["2"]);
    }

    #[test]
    fn test_constraints_combine_with_and() {
        let filter = PropertyFilter::from_criteria(
            &Criteria::new().with_query("st").with_amenity("pool").with_max_price(300_000.0),
        );
        assert_eq!(filter.constraints().len(), 3);
        assert_eq!(ids(&filter.apply(&catalog())), vec!["1"]);
    }
}
