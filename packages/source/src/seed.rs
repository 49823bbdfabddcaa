//! Embedded seed listings.
//!
//! The sample set in `seed/listings.toml` is baked into the binary at
//! compile time via [`include_str!`] so the application works offline.

use apartment_spot_listing_models::Listing;
use async_trait::async_trait;
use serde::Deserialize;

use crate::{ListingSource, SourceError};

const SEED_TOML: &str = include_str!("../seed/listings.toml");

#[derive(Deserialize)]
struct SeedFile {
    listings: Vec<Listing>,
}

/// A fixed, in-memory listing set.
#[derive(Debug, Clone)]
pub struct SeedListingSource {
    listings: Vec<Listing>,
}

impl SeedListingSource {
    /// Loads the embedded seed set.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Seed`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, SourceError> {
        Self::from_toml(SEED_TOML)
    }

    /// Parses a seed set from a TOML document with a `[[listings]]` array.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Seed`] if the document does not parse.
    pub fn from_toml(content: &str) -> Result<Self, SourceError> {
        let file: SeedFile = toml::from_str(content)?;
        log::debug!("Loaded {} seed listings", file.listings.len());
        Ok(Self {
            listings: file.listings,
        })
    }

    /// Wraps an existing listing set.
    #[must_use]
    pub const fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }
}

#[async_trait]
impl ListingSource for SeedListingSource {
    fn name(&self) -> &str {
        "seed"
    }

    async fn fetch_listings(&self) -> Result<Vec<Listing>, SourceError> {
        Ok(self.listings.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn embedded_seed_parses() {
        let seed = SeedListingSource::embedded().unwrap();
        assert_eq!(seed.listings().len(), 5);

        let ids: HashSet<_> = seed.listings().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), seed.listings().len(), "seed ids must be unique");
    }

    #[test]
    fn seed_contains_an_unlocated_listing() {
        let seed = SeedListingSource::embedded().unwrap();
        let unlocated: Vec<_> = seed
            .listings()
            .iter()
            .filter(|l| l.position().is_none())
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(unlocated, ["apt5"]);
    }

    #[test]
    fn seed_photos_and_defaults() {
        let seed = SeedListingSource::embedded().unwrap();
        let apt1 = &seed.listings()[0];
        assert_eq!(apt1.photos.len(), 2);
        assert_eq!(apt1.photos[0].hint, "modern apartment");
        assert!(apt1.conditions.is_none());
        assert!((seed.listings()[2].bathrooms - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_seed_is_an_error() {
        let result = SeedListingSource::from_toml("[[listings]]\nid = 1\n");
        assert!(matches!(result, Err(SourceError::Seed(_))));
    }

    #[tokio::test]
    async fn fetch_returns_full_set() {
        let seed = SeedListingSource::embedded().unwrap();
        let fetched = seed.fetch_listings().await.unwrap();
        assert_eq!(fetched, seed.listings());
    }
}
