#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing filter engine.
//!
//! Reduces a full listing set to the listings matching a [`PredicateSet`].
//! The four predicates (text, price, bedrooms, bathrooms) combine with
//! logical AND and are evaluated independently, so application order never
//! changes the result. Filtering is a pure function: it never fails and
//! never mutates its inputs.

use apartment_spot_filter_models::{Minimum, PredicateSet, PriceRange};
use apartment_spot_listing_models::Listing;

pub use apartment_spot_filter_models as models;

/// Returns the listings that satisfy every predicate in `predicates`,
/// preserving input order.
///
/// An empty input yields an empty output. Inconsistent predicates (such as
/// a lower price bound above the upper bound) yield an empty result rather
/// than an error.
#[must_use]
pub fn apply(listings: &[Listing], predicates: &PredicateSet) -> Vec<Listing> {
    let needle = predicates.query.to_lowercase();

    let matched: Vec<Listing> = listings
        .iter()
        .filter(|listing| matches_prepared(listing, predicates, &needle))
        .cloned()
        .collect();

    log::debug!(
        "apply: {} of {} listings matched (active: {:?})",
        matched.len(),
        listings.len(),
        predicates.active_fields()
    );

    matched
}

/// Whether a single listing satisfies every predicate.
#[must_use]
pub fn matches(listing: &Listing, predicates: &PredicateSet) -> bool {
    matches_prepared(listing, predicates, &predicates.query.to_lowercase())
}

fn matches_prepared(listing: &Listing, predicates: &PredicateSet, needle: &str) -> bool {
    matches_query(listing, needle)
        && matches_price(listing, predicates.price)
        && matches_bedrooms(listing, predicates.min_bedrooms)
        && matches_bathrooms(listing, predicates.min_bathrooms)
}

/// Case-insensitive substring match against title or address.
///
/// `needle` must already be lowercased. An empty needle matches everything.
fn matches_query(listing: &Listing, needle: &str) -> bool {
    needle.is_empty()
        || listing.title.to_lowercase().contains(needle)
        || listing.address.to_lowercase().contains(needle)
}

fn matches_price(listing: &Listing, range: PriceRange) -> bool {
    range.contains(listing.price)
}

/// `AtLeast(0)` still compares with `>=`, so it means "studio or larger".
fn matches_bedrooms(listing: &Listing, min: Minimum<u32>) -> bool {
    min.bound().is_none_or(|min| listing.bedrooms >= min)
}

fn matches_bathrooms(listing: &Listing, min: Minimum<f64>) -> bool {
    min.bound().is_none_or(|min| listing.bathrooms >= min)
}

/// Holds the active predicates and applies them to listing sets.
///
/// Every setter replaces exactly one predicate; [`FilterEngine::reset`]
/// restores the defaults, after which [`FilterEngine::apply`] returns its
/// input unchanged.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    predicates: PredicateSet,
}

impl FilterEngine {
    /// Creates an engine with default (match-all) predicates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given predicates.
    #[must_use]
    pub const fn with_predicates(predicates: PredicateSet) -> Self {
        Self { predicates }
    }

    /// The active predicates.
    #[must_use]
    pub const fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    /// Replaces the free-text query.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.predicates.query = query.into();
    }

    /// Replaces the price bounds. `max = None` means unbounded.
    pub const fn set_price_range(&mut self, min: f64, max: Option<f64>) {
        self.predicates.price = PriceRange::new(min, max);
    }

    /// Replaces the bedroom minimum.
    pub const fn set_min_bedrooms(&mut self, min: Minimum<u32>) {
        self.predicates.min_bedrooms = min;
    }

    /// Replaces the bathroom minimum.
    pub const fn set_min_bathrooms(&mut self, min: Minimum<f64>) {
        self.predicates.min_bathrooms = min;
    }

    /// Restores every predicate to its default.
    pub fn reset(&mut self) {
        self.predicates = PredicateSet::default();
    }

    /// Whether the engine currently filters nothing.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.predicates.is_default()
    }

    /// Applies the active predicates to `listings`.
    #[must_use]
    pub fn apply(&self, listings: &[Listing]) -> Vec<Listing> {
        apply(listings, &self.predicates)
    }
}
