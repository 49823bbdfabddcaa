#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map rendering types.
//!
//! These types describe what the map shows (markers, popups, viewport)
//! as plain data. They carry no rendering technology; a map surface
//! implementation decides how to draw them.

use apartment_spot_listing_models::{GeoPosition, Listing, format_price};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle of a map renderer's surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MapState {
    /// No surface has been created yet.
    Uninitialized,
    /// The surface and base tile layer exist; markers can be drawn.
    Initialized,
    /// The surface and every marker have been released.
    Disposed,
}

/// Raster tile layer drawn under the markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    /// URL template with `{s}`, `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    /// Attribution text required by the tile provider.
    pub attribution: String,
}

/// The visible map region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Center of the view.
    pub center: GeoPosition,
    /// Zoom level.
    pub zoom: u8,
}

/// Identifies a marker on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum MarkerId {
    /// The "you are here" marker. At most one exists.
    User,
    /// A listing marker, keyed by listing id.
    Listing(String),
}

/// Visual style of a marker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerIcon {
    /// Navigation arrow shown at the device's position.
    UserLocation,
    /// Pin shown at a listing's position.
    ListingPin,
}

/// Summary shown when a listing marker is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPopup {
    /// Listing identifier, used to navigate to the detail view.
    pub listing_id: String,
    /// Listing title.
    pub title: String,
    /// Street address.
    pub address: String,
    /// Formatted price (e.g. `₹3,200`).
    pub price_label: String,
    /// Thumbnail image URL, if the listing has photos.
    pub thumbnail_url: Option<String>,
    /// Path of the listing's detail page.
    pub detail_path: String,
}

impl ListingPopup {
    /// Builds popup content for a listing.
    #[must_use]
    pub fn from_listing(listing: &Listing, currency_symbol: &str, detail_prefix: &str) -> Self {
        Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            address: listing.address.clone(),
            price_label: format_price(currency_symbol, listing.price),
            thumbnail_url: listing.thumbnail_url().map(str::to_string),
            detail_path: listing.detail_path(detail_prefix),
        }
    }
}

/// Popup attached to a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MarkerPopup {
    /// Static text for the user marker.
    UserLocation {
        /// Text to show (e.g. "You are here").
        text: String,
    },
    /// Listing summary.
    Listing(ListingPopup),
}

/// A marker drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker identity.
    pub id: MarkerId,
    /// Where the marker is drawn.
    pub position: GeoPosition,
    /// Visual style.
    pub icon: MarkerIcon,
    /// Content revealed on click/tap.
    pub popup: MarkerPopup,
}

impl Marker {
    /// Builds the marker for a listing, or `None` if the listing has no
    /// valid position.
    #[must_use]
    pub fn for_listing(listing: &Listing, currency_symbol: &str, detail_prefix: &str) -> Option<Self> {
        let position = listing.position()?;
        Some(Self {
            id: MarkerId::Listing(listing.id.clone()),
            position,
            icon: MarkerIcon::ListingPin,
            popup: MarkerPopup::Listing(ListingPopup::from_listing(
                listing,
                currency_symbol,
                detail_prefix,
            )),
        })
    }

    /// Builds the "you are here" marker.
    #[must_use]
    pub fn for_user(position: GeoPosition) -> Self {
        Self {
            id: MarkerId::User,
            position,
            icon: MarkerIcon::UserLocation,
            popup: MarkerPopup::UserLocation {
                text: USER_MARKER_TEXT.to_string(),
            },
        }
    }
}

/// Popup text of the user marker.
pub const USER_MARKER_TEXT: &str = "You are here";

/// Why a geolocation request did not produce a position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    /// The user refused location access.
    #[error("geolocation permission denied")]
    PermissionDenied,
    /// The provider did not answer in time.
    #[error("geolocation request timed out")]
    Timeout,
    /// The host has no geolocation support.
    #[error("geolocation unavailable")]
    Unavailable,
    /// The provider returned coordinates that are not a valid position.
    #[error("invalid position reported: lat={latitude}, lng={longitude}")]
    InvalidPosition {
        /// Reported latitude, formatted.
        latitude: String,
        /// Reported longitude, formatted.
        longitude: String,
    },
    /// Any other provider failure.
    #[error("geolocation failed: {message}")]
    Other {
        /// Provider-supplied description.
        message: String,
    },
}

/// Result of a single geolocation request.
pub type GeolocationOutcome = Result<GeoPosition, GeolocationError>;

/// Static settings for a map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    /// Center used until (or unless) a geolocation fix arrives.
    pub fallback_center: GeoPosition,
    /// Initial zoom level, reused when recentering on the user.
    pub zoom: u8,
    /// Base raster layer.
    pub tile_layer: TileLayer,
    /// Prefix for listing detail links (e.g. `/apartments/`).
    pub detail_path_prefix: String,
    /// Currency symbol used in popup prices.
    pub currency_symbol: String,
}

#[cfg(test)]
mod tests {
    use apartment_spot_listing_models::ListingPhoto;

    use super::*;

    fn listing(latitude: Option<f64>) -> Listing {
        Listing {
            id: "apt4".to_string(),
            landlord_id: "user5".to_string(),
            title: "Modern Loft with City Views".to_string(),
            description: String::new(),
            address: "101 Sky High Rd, Chicago, IL".to_string(),
            city: "Chicago".to_string(),
            latitude,
            longitude: Some(-87.6298),
            price: 4500.0,
            bedrooms: 1,
            bathrooms: 1.0,
            availability_date: None,
            photos: vec![ListingPhoto {
                id: "apartment-7".to_string(),
                url: "https://img/7.jpg".to_string(),
                hint: "loft".to_string(),
            }],
            amenities: vec![],
            conditions: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn listing_marker_carries_popup_data() {
        let marker = Marker::for_listing(&listing(Some(41.8781)), "₹", "/apartments/").unwrap();
        assert_eq!(marker.id, MarkerId::Listing("apt4".to_string()));
        assert_eq!(marker.icon, MarkerIcon::ListingPin);
        assert!((marker.position.latitude - 41.8781).abs() < f64::EPSILON);

        let MarkerPopup::Listing(popup) = marker.popup else {
            panic!("expected listing popup");
        };
        assert_eq!(popup.price_label, "₹4,500");
        assert_eq!(popup.detail_path, "/apartments/apt4");
        assert_eq!(popup.thumbnail_url.as_deref(), Some("https://img/7.jpg"));
    }

    #[test]
    fn listing_without_position_has_no_marker() {
        assert!(Marker::for_listing(&listing(None), "₹", "/apartments/").is_none());
        assert!(Marker::for_listing(&listing(Some(120.0)), "₹", "/apartments/").is_none());
    }

    #[test]
    fn user_marker_is_distinguishable() {
        let position = GeoPosition::new(26.85, 80.95).unwrap();
        let marker = Marker::for_user(position);
        assert_eq!(marker.id, MarkerId::User);
        assert_eq!(marker.icon, MarkerIcon::UserLocation);
        assert_eq!(
            marker.popup,
            MarkerPopup::UserLocation {
                text: "You are here".to_string()
            }
        );
    }

    #[test]
    fn map_state_names() {
        assert_eq!(MapState::Initialized.to_string(), "initialized");
        assert_eq!("disposed".parse::<MapState>(), Ok(MapState::Disposed));
    }
}
