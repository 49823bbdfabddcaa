#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing sources.
//!
//! Each provider implements the [`ListingSource`] trait and returns complete
//! listing snapshots in the canonical [`Listing`] shape. A snapshot always
//! replaces the previous one; sources never send partial updates.

pub mod feed;
pub mod rest;
mod retry;
pub mod seed;

use apartment_spot_listing_models::Listing;
use async_trait::async_trait;

pub use feed::spawn_polling_feed;
pub use rest::RestListingSource;
pub use seed::SeedListingSource;

/// Errors that can occur while fetching listings.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, or the status text.
        detail: String,
    },

    /// The embedded seed set could not be parsed.
    #[error("Seed data parse error: {0}")]
    Seed(#[from] toml::de::Error),
}

/// Trait that all listing sources implement.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Short human-readable name used in log lines (e.g. `"seed"`).
    fn name(&self) -> &str;

    /// Fetches the complete current listing set.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the listings cannot be retrieved or
    /// decoded.
    async fn fetch_listings(&self) -> Result<Vec<Listing>, SourceError>;
}
