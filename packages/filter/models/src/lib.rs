#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Search predicate types for apartment listings.
//!
//! A [`PredicateSet`] holds the active search criteria. Every field has a
//! default that matches all listings, so a freshly created set filters
//! nothing. The option catalogs ([`BedroomOption`], [`BathroomOption`])
//! mirror the choices offered by the search form.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A lower bound that may be disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Minimum<T> {
    /// No constraint.
    #[default]
    Any,
    /// Value must be greater than or equal to the bound.
    AtLeast(T),
}

impl<T: Copy> Minimum<T> {
    /// Returns the bound, or `None` for [`Minimum::Any`].
    #[must_use]
    pub const fn bound(self) -> Option<T> {
        match self {
            Self::Any => None,
            Self::AtLeast(v) => Some(v),
        }
    }

    /// Whether this is the unconstrained value.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// Error returned when a [`Minimum`] cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid minimum {input:?}: expected \"any\" or a number")]
pub struct ParseMinimumError {
    /// The rejected input.
    pub input: String,
}

impl<T: FromStr> FromStr for Minimum<T> {
    type Err = ParseMinimumError;

    /// Parses `"any"` (case-insensitive) or a plain number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        trimmed
            .parse::<T>()
            .map(Self::AtLeast)
            .map_err(|_| ParseMinimumError {
                input: s.to_string(),
            })
    }
}

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Lower bound (default 0).
    pub min: f64,
    /// Upper bound. `None` is the "no upper bound" sentinel.
    pub max: Option<f64>,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: None,
        }
    }
}

impl PriceRange {
    /// Creates a range from explicit bounds.
    ///
    /// Inverted bounds are accepted; they simply match nothing.
    #[must_use]
    pub const fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Converts a price slider position into a range.
    ///
    /// The slider's top stop means "and above", so an upper handle exactly
    /// at `slider_max` becomes the unbounded sentinel. Any other upper value,
    /// including one above the slider, is kept as a real bound.
    #[must_use]
    pub fn from_slider(low: f64, high: f64, slider_max: f64) -> Self {
        let max = if (high - slider_max).abs() < f64::EPSILON {
            None
        } else {
            Some(high)
        };
        Self { min: low, max }
    }

    /// Whether this range is the default `[0, unbounded]`.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.min == 0.0 && self.max.is_none()
    }

    /// Whether `price` falls inside the range.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && self.max.is_none_or(|max| price <= max)
    }

    /// Human-readable label, e.g. `$500 - $8000+` for an unbounded range
    /// on an 8000 slider.
    #[must_use]
    pub fn label(&self, slider_max: f64) -> String {
        match self.max {
            Some(max) => format!("${} - ${}", self.min, max),
            None => format!("${} - ${slider_max}+", self.min),
        }
    }
}

/// Names of the individual predicates, used for logging and diagnostics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterField {
    /// Free-text search over title and address.
    Query,
    /// Price bounds.
    Price,
    /// Minimum bedroom count.
    Bedrooms,
    /// Minimum bathroom count.
    Bathrooms,
}

/// The active search criteria.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredicateSet {
    /// Case-insensitive substring matched against title and address.
    /// Empty matches everything.
    pub query: String,
    /// Price bounds.
    pub price: PriceRange,
    /// Minimum bedrooms. `AtLeast(0)` means "studio or larger".
    pub min_bedrooms: Minimum<u32>,
    /// Minimum bathrooms.
    pub min_bathrooms: Minimum<f64>,
}

impl PredicateSet {
    /// Whether every field is at its default, i.e. the set matches every
    /// listing.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.active_fields().is_empty()
    }

    /// Lists the predicates that currently constrain the result.
    #[must_use]
    pub fn active_fields(&self) -> Vec<FilterField> {
        let mut fields = Vec::new();
        if !self.query.is_empty() {
            fields.push(FilterField::Query);
        }
        if !self.price.is_default() {
            fields.push(FilterField::Price);
        }
        if !self.min_bedrooms.is_any() {
            fields.push(FilterField::Bedrooms);
        }
        if !self.min_bathrooms.is_any() {
            fields.push(FilterField::Bathrooms);
        }
        fields
    }
}

/// Bedroom choices offered by the search form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum BedroomOption {
    /// No constraint.
    #[default]
    #[strum(serialize = "any")]
    Any,
    /// Studio or larger.
    #[strum(serialize = "0")]
    StudioPlus,
    /// One bedroom or more.
    #[strum(serialize = "1")]
    OnePlus,
    /// Two bedrooms or more.
    #[strum(serialize = "2")]
    TwoPlus,
    /// Three bedrooms or more.
    #[strum(serialize = "3")]
    ThreePlus,
}

impl BedroomOption {
    /// Returns all variants of this enum, in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Any,
            Self::StudioPlus,
            Self::OnePlus,
            Self::TwoPlus,
            Self::ThreePlus,
        ]
    }

    /// Label shown in the picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::StudioPlus => "Studio+",
            Self::OnePlus => "1+",
            Self::TwoPlus => "2+",
            Self::ThreePlus => "3+",
        }
    }

    /// The predicate value this choice selects.
    #[must_use]
    pub const fn minimum(self) -> Minimum<u32> {
        match self {
            Self::Any => Minimum::Any,
            Self::StudioPlus => Minimum::AtLeast(0),
            Self::OnePlus => Minimum::AtLeast(1),
            Self::TwoPlus => Minimum::AtLeast(2),
            Self::ThreePlus => Minimum::AtLeast(3),
        }
    }
}

/// Bathroom choices offered by the search form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum BathroomOption {
    /// No constraint.
    #[default]
    #[strum(serialize = "any")]
    Any,
    /// One bathroom or more.
    #[strum(serialize = "1")]
    OnePlus,
    /// Two bathrooms or more.
    #[strum(serialize = "2")]
    TwoPlus,
    /// Three bathrooms or more.
    #[strum(serialize = "3")]
    ThreePlus,
}

impl BathroomOption {
    /// Returns all variants of this enum, in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Any, Self::OnePlus, Self::TwoPlus, Self::ThreePlus]
    }

    /// Label shown in the picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::OnePlus => "1+",
            Self::TwoPlus => "2+",
            Self::ThreePlus => "3+",
        }
    }

    /// The predicate value this choice selects.
    #[must_use]
    pub const fn minimum(self) -> Minimum<f64> {
        match self {
            Self::Any => Minimum::Any,
            Self::OnePlus => Minimum::AtLeast(1.0),
            Self::TwoPlus => Minimum::AtLeast(2.0),
            Self::ThreePlus => Minimum::AtLeast(3.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_has_no_active_fields() {
        let set = PredicateSet::default();
        assert!(set.is_default());
        assert!(set.active_fields().is_empty());
    }

    #[test]
    fn active_fields_track_each_predicate() {
        let set = PredicateSet {
            query: "main".to_string(),
            price: PriceRange::new(0.0, Some(2000.0)),
            min_bedrooms: Minimum::AtLeast(0),
            min_bathrooms: Minimum::Any,
        };
        assert_eq!(
            set.active_fields(),
            vec![FilterField::Query, FilterField::Price, FilterField::Bedrooms]
        );
        assert!(!set.is_default());
    }

    #[test]
    fn minimum_parses_any_and_numbers() {
        assert_eq!("any".parse::<Minimum<u32>>(), Ok(Minimum::Any));
        assert_eq!("ANY".parse::<Minimum<u32>>(), Ok(Minimum::Any));
        assert_eq!(" 2 ".parse::<Minimum<u32>>(), Ok(Minimum::AtLeast(2)));
        assert_eq!("1.5".parse::<Minimum<f64>>(), Ok(Minimum::AtLeast(1.5)));
        assert!("two".parse::<Minimum<u32>>().is_err());
        assert!("-1".parse::<Minimum<u32>>().is_err());
    }

    #[test]
    fn slider_top_stop_is_unbounded() {
        let range = PriceRange::from_slider(500.0, 8000.0, 8000.0);
        assert_eq!(range.max, None);
        assert!(range.contains(50_000.0));
        assert!(!range.contains(499.0));
        assert_eq!(range.label(8000.0), "$500 - $8000+");

        let bounded = PriceRange::from_slider(0.0, 2500.0, 8000.0);
        assert_eq!(bounded.max, Some(2500.0));
        assert!(bounded.contains(2500.0));
        assert!(!bounded.contains(2500.01));
        assert_eq!(bounded.label(8000.0), "$0 - $2500");
    }

    #[test]
    fn values_past_the_slider_stay_bounded() {
        let range = PriceRange::from_slider(0.0, 9000.0, 8000.0);
        assert_eq!(range.max, Some(9000.0));
        assert!(range.contains(9000.0));
        assert!(!range.contains(20_000.0));
    }

    #[test]
    fn negative_minimum_is_not_the_default_range() {
        assert!(PriceRange::default().is_default());
        assert!(!PriceRange::new(-100.0, None).is_default());
        assert!(!PriceRange::new(0.0, Some(8000.0)).is_default());

        let set = PredicateSet {
            price: PriceRange::new(-100.0, None),
            ..PredicateSet::default()
        };
        assert_eq!(set.active_fields(), vec![FilterField::Price]);
    }

    #[test]
    fn inverted_range_contains_nothing() {
        let range = PriceRange::new(3000.0, Some(1000.0));
        for price in [0.0, 1000.0, 2000.0, 3000.0, 9000.0] {
            assert!(!range.contains(price), "{price} should not match");
        }
    }

    #[test]
    fn option_catalogs_round_trip_through_form_values() {
        for option in BedroomOption::all() {
            let parsed: BedroomOption = option.as_ref().parse().unwrap();
            assert_eq!(parsed, *option);
        }
        for option in BathroomOption::all() {
            let parsed: BathroomOption = option.to_string().parse().unwrap();
            assert_eq!(parsed, *option);
        }
        assert_eq!(BedroomOption::StudioPlus.minimum(), Minimum::AtLeast(0));
        assert_eq!(BedroomOption::StudioPlus.label(), "Studio+");
        assert_eq!(BathroomOption::Any.minimum(), Minimum::Any);
    }
}
