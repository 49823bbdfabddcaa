#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical apartment listing types.
//!
//! Every listing source (embedded seed data, the REST API, a polling feed)
//! normalizes into the [`Listing`] shape defined here. The JSON layout is
//! the flat snake_case one: `latitude`, `longitude` and `availability_date`
//! live at the top level of the record rather than under a nested
//! `location` object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single apartment record available for search and display.
///
/// Listings are created and updated by the listing source; the search and
/// map pipeline only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Opaque identifier, unique within a listing source.
    pub id: String,
    /// Identifier of the landlord who owns the listing.
    #[serde(default)]
    pub landlord_id: String,
    /// Short headline (e.g. "Sunny 2-Bedroom in Downtown").
    pub title: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Street address.
    pub address: String,
    /// City name.
    #[serde(default)]
    pub city: String,
    /// Latitude (WGS84). `None` when the listing was never geocoded or the
    /// value could not be read as a number.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` when the listing was never geocoded or the
    /// value could not be read as a number.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    /// Monthly rent, currency-agnostic.
    pub price: f64,
    /// Number of bedrooms (0 for a studio).
    pub bedrooms: u32,
    /// Number of bathrooms, in half-bath increments.
    pub bathrooms: f64,
    /// Either an ISO date (`2024-09-01`) or free text such as
    /// `"Available Now"`.
    #[serde(default)]
    pub availability_date: Option<String>,
    /// Photos in display order; the first one is the thumbnail.
    #[serde(default)]
    pub photos: Vec<ListingPhoto>,
    /// Amenity labels (e.g. "Gym", "Parking").
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Free-form rental conditions.
    #[serde(default)]
    pub conditions: Option<String>,
    /// When the listing was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the listing was last updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Any JSON value that may show up in a coordinate field.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Reads a coordinate that may be a number, a numeric string, or junk.
/// Anything that is not a number becomes `None` instead of failing the
/// whole record.
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawCoordinate::deserialize(deserializer)? {
        RawCoordinate::Number(value) => Some(value),
        RawCoordinate::Text(text) => text.trim().parse().ok(),
        RawCoordinate::Other(_) => None,
    })
}

/// A photo attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPhoto {
    /// Photo identifier.
    pub id: String,
    /// Image URL.
    pub url: String,
    /// Short alt-text style hint (e.g. "modern apartment").
    #[serde(default)]
    pub hint: String,
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in degrees, within `-90..=90`.
    pub latitude: f64,
    /// Longitude in degrees, within `-180..=180`.
    pub longitude: f64,
}

impl GeoPosition {
    /// Builds a position, rejecting non-finite or out-of-range coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

impl Listing {
    /// Returns the listing's geographic position, or `None` if either
    /// coordinate is missing or malformed.
    ///
    /// Listings without a position still appear in the grid but never
    /// produce a map marker.
    #[must_use]
    pub fn position(&self) -> Option<GeoPosition> {
        GeoPosition::new(self.latitude?, self.longitude?)
    }

    /// Returns the thumbnail photo URL, if the listing has any photos.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.photos.first().map(|p| p.url.as_str())
    }

    /// Path of the listing's detail page (e.g. `/apartments/apt1`).
    #[must_use]
    pub fn detail_path(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.id)
    }
}

/// Formats a price with thousands separators, e.g. `$3,200` or
/// `₹12,500.50`. Whole amounts drop the fractional part.
#[must_use]
pub fn format_price(symbol: &str, price: f64) -> String {
    if !price.is_finite() {
        return format!("{symbol}{price}");
    }

    let sign = if price < 0.0 { "-" } else { "" };
    let cents = (price.abs() * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = cents as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction == 0 {
        format!("{sign}{symbol}{grouped}")
    } else {
        format!("{sign}{symbol}{grouped}.{fraction:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_prices_with_grouping() {
        assert_eq!(format_price("$", 0.0), "$0");
        assert_eq!(format_price("$", 950.0), "$950");
        assert_eq!(format_price("$", 3200.0), "$3,200");
        assert_eq!(format_price("₹", 1_234_567.0), "₹1,234,567");
        assert_eq!(format_price("$", 1500.5), "$1,500.50");
        assert_eq!(format_price("$", -42.0), "-$42");
    }

    fn listing(latitude: Option<f64>, longitude: Option<f64>) -> Listing {
        Listing {
            id: "apt1".to_string(),
            landlord_id: "user2".to_string(),
            title: "Sunny 2-Bedroom in Downtown".to_string(),
            description: String::new(),
            address: "123 Main St, San Francisco, CA".to_string(),
            city: "San Francisco".to_string(),
            latitude,
            longitude,
            price: 3200.0,
            bedrooms: 2,
            bathrooms: 2.0,
            availability_date: Some("2024-09-01".to_string()),
            photos: vec![],
            amenities: vec![],
            conditions: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn position_requires_both_coordinates() {
        assert!(listing(Some(37.77), Some(-122.41)).position().is_some());
        assert!(listing(None, Some(-122.41)).position().is_none());
        assert!(listing(Some(37.77), None).position().is_none());
    }

    #[test]
    fn malformed_coordinates_are_treated_as_absent() {
        assert!(listing(Some(f64::NAN), Some(0.0)).position().is_none());
        assert!(listing(Some(91.0), Some(0.0)).position().is_none());
        assert!(listing(Some(0.0), Some(-180.5)).position().is_none());
        assert!(listing(Some(0.0), Some(f64::INFINITY)).position().is_none());
    }

    #[test]
    fn deserializes_flat_layout_with_null_latitude() {
        let json = serde_json::json!({
            "id": "apt9",
            "title": "Garden Flat",
            "address": "9 Elm St",
            "latitude": null,
            "longitude": -97.7,
            "price": 1500,
            "bedrooms": 1,
            "bathrooms": 1.5,
            "availability_date": "Available Now"
        });

        let parsed: Listing = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.id, "apt9");
        assert!(parsed.position().is_none());
        assert!(parsed.photos.is_empty());
        assert_eq!(parsed.availability_date.as_deref(), Some("Available Now"));
        assert!((parsed.bathrooms - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn coordinates_accept_numeric_strings_and_drop_junk() {
        let parse = |latitude: serde_json::Value, longitude: serde_json::Value| {
            let json = serde_json::json!({
                "id": "apt9",
                "title": "Garden Flat",
                "address": "9 Elm St",
                "latitude": latitude,
                "longitude": longitude,
                "price": 1500,
                "bedrooms": 1,
                "bathrooms": 1.0
            });
            serde_json::from_value::<Listing>(json).unwrap()
        };

        let listing = parse(serde_json::json!(" 37.7 "), serde_json::json!("-122.4"));
        assert_eq!(listing.latitude, Some(37.7));
        assert_eq!(listing.longitude, Some(-122.4));
        assert!(listing.position().is_some());

        let listing = parse(serde_json::json!("oops"), serde_json::json!({ "lng": 1 }));
        assert_eq!(listing.latitude, None);
        assert_eq!(listing.longitude, None);

        let listing = parse(serde_json::json!(true), serde_json::json!([1.0]));
        assert!(listing.position().is_none());
    }

    #[test]
    fn thumbnail_is_first_photo() {
        let mut l = listing(None, None);
        assert_eq!(l.thumbnail_url(), None);

        l.photos = vec![
            ListingPhoto {
                id: "p1".to_string(),
                url: "https://img/1.jpg".to_string(),
                hint: "living room".to_string(),
            },
            ListingPhoto {
                id: "p2".to_string(),
                url: "https://img/2.jpg".to_string(),
                hint: String::new(),
            },
        ];
        assert_eq!(l.thumbnail_url(), Some("https://img/1.jpg"));
        assert_eq!(l.detail_path("/apartments/"), "/apartments/apt1");
    }
}
