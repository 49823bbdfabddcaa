#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View-state synchronizer for listing search.
//!
//! [`ListingSynchronizer`] owns the single source of truth for "which
//! listings are currently shown": the [`Projection`]. It is recomputed
//! synchronously whenever the listing source delivers a new set or the
//! user changes a predicate, so it always reflects the latest of both.
//! Grid and map renderers read the same projection, either directly or
//! through a [`ProjectionObserver`].
//!
//! The synchronizer itself is single-threaded. [`SharedSynchronizer`]
//! serializes both kinds of updates behind a mutex for multi-threaded
//! hosts, and [`drive_feed`] applies deliveries from an async channel.

mod shared;

use apartment_spot_filter::FilterEngine;
use apartment_spot_filter::models::{Minimum, PredicateSet};
use apartment_spot_listing_models::Listing;

pub use shared::{SharedSynchronizer, drive_feed};

/// The listings currently matching the active predicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    /// No listing set has arrived yet. Renderers show a loading state.
    #[default]
    NotLoaded,
    /// The filtered listings. May be empty ("no results").
    Loaded(Vec<Listing>),
}

impl Projection {
    /// Whether the first listing set has arrived.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The matching listings, or `None` while loading.
    #[must_use]
    pub fn listings(&self) -> Option<&[Listing]> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(listings) => Some(listings),
        }
    }

    /// Number of matching listings (0 while loading).
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings().map_or(0, <[Listing]>::len)
    }

    /// Whether there are no matching listings (also true while loading).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives the projection after every recomputation.
///
/// Implemented for any `FnMut(&Projection) + Send` closure.
pub trait ProjectionObserver: Send {
    /// Called synchronously after the projection changed.
    fn projection_changed(&mut self, projection: &Projection);
}

impl<F: FnMut(&Projection) + Send> ProjectionObserver for F {
    fn projection_changed(&mut self, projection: &Projection) {
        self(projection);
    }
}

/// Handle returned by [`ListingSynchronizer::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What happened to a listing delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The listing set replaced the previous one and the projection was
    /// recomputed.
    Applied,
    /// The synchronizer was unmounted; the delivery was dropped.
    Discarded,
}

/// Keeps the filtered projection in sync with the listing source and the
/// active predicates.
pub struct ListingSynchronizer {
    engine: FilterEngine,
    listings: Option<Vec<Listing>>,
    projection: Projection,
    observers: Vec<(SubscriptionId, Box<dyn ProjectionObserver>)>,
    next_subscription: u64,
    revision: u64,
    mounted: bool,
}

impl Default for ListingSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListingSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingSynchronizer")
            .field("predicates", self.engine.predicates())
            .field("listings", &self.listings.as_ref().map(Vec::len))
            .field("projection", &self.projection.len())
            .field("observers", &self.observers.len())
            .field("revision", &self.revision)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl ListingSynchronizer {
    /// Creates a mounted synchronizer with default predicates and no
    /// listings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: FilterEngine::new(),
            listings: None,
            projection: Projection::NotLoaded,
            observers: Vec::new(),
            next_subscription: 0,
            revision: 0,
            mounted: true,
        }
    }

    /// The current projection.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// The active predicates.
    #[must_use]
    pub const fn predicates(&self) -> &PredicateSet {
        self.engine.predicates()
    }

    /// The most recently delivered, unfiltered listing set.
    #[must_use]
    pub fn listings(&self) -> Option<&[Listing]> {
        self.listings.as_deref()
    }

    /// Incremented on every recomputation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the synchronizer still accepts updates.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Registers an observer. It is not called until the next change.
    pub fn subscribe(&mut self, observer: impl ProjectionObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Replaces the listing set with a new delivery from the source.
    ///
    /// Every delivery is a complete replacement, never a delta. After
    /// [`ListingSynchronizer::unmount`] the delivery is discarded.
    pub fn on_listings(&mut self, listings: Vec<Listing>) -> Delivery {
        if !self.mounted {
            log::debug!(
                "Discarding delivery of {} listings after unmount",
                listings.len()
            );
            return Delivery::Discarded;
        }

        log::debug!("Received {} listings", listings.len());
        self.listings = Some(listings);
        self.recompute();
        Delivery::Applied
    }

    /// Sets the free-text query.
    pub fn set_query(&mut self, query: impl Into<String>) {
        if self.accepts_predicate_change() {
            self.engine.set_query(query);
            self.recompute();
        }
    }

    /// Sets the price bounds. `max = None` means unbounded.
    pub fn set_price_range(&mut self, min: f64, max: Option<f64>) {
        if self.accepts_predicate_change() {
            self.engine.set_price_range(min, max);
            self.recompute();
        }
    }

    /// Sets the bedroom minimum.
    pub fn set_min_bedrooms(&mut self, min: Minimum<u32>) {
        if self.accepts_predicate_change() {
            self.engine.set_min_bedrooms(min);
            self.recompute();
        }
    }

    /// Sets the bathroom minimum.
    pub fn set_min_bathrooms(&mut self, min: Minimum<f64>) {
        if self.accepts_predicate_change() {
            self.engine.set_min_bathrooms(min);
            self.recompute();
        }
    }

    /// Replaces every predicate at once (e.g. an "apply filters" button).
    pub fn set_predicates(&mut self, predicates: PredicateSet) {
        if self.accepts_predicate_change() {
            self.engine = FilterEngine::with_predicates(predicates);
            self.recompute();
        }
    }

    /// Restores default predicates; the projection becomes the last
    /// delivered listing set.
    pub fn reset(&mut self) {
        if self.accepts_predicate_change() {
            self.engine.reset();
            self.recompute();
        }
    }

    /// Stops accepting updates and drops all observers. Deliveries still
    /// in flight are discarded when they arrive.
    pub fn unmount(&mut self) {
        if self.mounted {
            log::debug!("Unmounting listing synchronizer");
            self.mounted = false;
            self.observers.clear();
        }
    }

    fn accepts_predicate_change(&self) -> bool {
        if !self.mounted {
            log::debug!("Ignoring predicate change after unmount");
        }
        self.mounted
    }

    fn recompute(&mut self) {
        let Some(listings) = &self.listings else {
            log::debug!(
                "Predicates changed before listings loaded (active: {:?})",
                self.engine.predicates().active_fields()
            );
            return;
        };

        self.projection = if self.engine.is_default() {
            Projection::Loaded(listings.clone())
        } else {
            Projection::Loaded(self.engine.apply(listings))
        };
        self.revision += 1;

        log::debug!(
            "Projection r{}: {} of {} listings (active: {:?})",
            self.revision,
            self.projection.len(),
            listings.len(),
            self.engine.predicates().active_fields()
        );

        for (_, observer) in &mut self.observers {
            observer.projection_changed(&self.projection);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use apartment_spot_filter::models::PriceRange;

    use super::*;

    fn listing(id: &str, address: &str, price: f64, bed: u32, bath: f64) -> Listing {
        Listing {
            id: id.to_string(),
            landlord_id: String::new(),
            title: format!("Apartment {id}"),
            description: String::new(),
            address: address.to_string(),
            city: String::new(),
            latitude: None,
            longitude: None,
            price,
            bedrooms: bed,
            bathrooms: bath,
            availability_date: None,
            photos: vec![],
            amenities: vec![],
            conditions: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn fixture() -> Vec<Listing> {
        vec![
            listing("1", "123 Main St", 1000.0, 1, 1.0),
            listing("2", "456 Oak Ave", 5000.0, 3, 2.0),
            listing("3", "789 Pine Rd", 2500.0, 2, 1.5),
        ]
    }

    fn ids(projection: &Projection) -> Vec<String> {
        projection
            .listings()
            .unwrap_or_default()
            .iter()
            .map(|l| l.id.clone())
            .collect()
    }

    #[test]
    fn starts_not_loaded_and_distinguishes_empty() {
        let mut sync = ListingSynchronizer::new();
        assert_eq!(sync.projection(), &Projection::NotLoaded);
        assert!(!sync.projection().is_loaded());

        sync.on_listings(vec![]);
        assert_eq!(sync.projection(), &Projection::Loaded(vec![]));
        assert!(sync.projection().is_loaded());
        assert!(sync.projection().is_empty());
    }

    #[test]
    fn default_predicates_pass_listings_through() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        assert_eq!(sync.projection(), &Projection::Loaded(fixture()));
    }

    #[test]
    fn predicate_change_before_load_applies_on_arrival() {
        let mut sync = ListingSynchronizer::new();
        sync.set_min_bedrooms(Minimum::AtLeast(2));
        assert_eq!(sync.projection(), &Projection::NotLoaded);

        sync.on_listings(fixture());
        assert_eq!(ids(sync.projection()), vec!["2", "3"]);
    }

    #[test]
    fn new_delivery_is_filtered_with_existing_predicates() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        sync.set_query("oak");
        assert_eq!(ids(sync.projection()), vec!["2"]);

        let mut next = fixture();
        next.push(listing("4", "12 Oak Ct", 900.0, 0, 1.0));
        sync.on_listings(next);
        assert_eq!(ids(sync.projection()), vec!["2", "4"]);
    }

    #[test]
    fn predicate_change_uses_latest_listings() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        sync.on_listings(vec![listing("9", "1 Elm St", 3000.0, 4, 3.0)]);
        sync.set_min_bathrooms(Minimum::AtLeast(2.0));
        assert_eq!(ids(sync.projection()), vec!["9"]);
    }

    #[test]
    fn reset_restores_last_full_listing_set() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        sync.set_query("main");
        sync.set_price_range(2000.0, Some(3000.0));
        sync.set_min_bedrooms(Minimum::AtLeast(3));
        sync.set_min_bathrooms(Minimum::AtLeast(1.0));
        assert!(sync.projection().is_empty());

        sync.reset();
        assert!(sync.predicates().is_default());
        assert_eq!(sync.projection(), &Projection::Loaded(fixture()));
    }

    #[test]
    fn reset_then_delivery_is_not_filtered_by_stale_predicates() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        sync.set_predicates(PredicateSet {
            price: PriceRange::new(0.0, Some(1500.0)),
            ..PredicateSet::default()
        });
        assert_eq!(ids(sync.projection()), vec!["1"]);

        sync.reset();
        let next = vec![listing("5", "5 Bay Rd", 9000.0, 2, 2.0)];
        sync.on_listings(next.clone());
        assert_eq!(sync.projection(), &Projection::Loaded(next));
    }

    #[test]
    fn inverted_price_bounds_give_loaded_empty_projection() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        sync.set_price_range(4000.0, Some(1000.0));
        assert_eq!(sync.projection(), &Projection::Loaded(vec![]));
    }

    #[test]
    fn observers_see_every_recomputation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sync = ListingSynchronizer::new();
        let sink = Arc::clone(&seen);
        let id = sync.subscribe(move |p: &Projection| sink.lock().unwrap().push(p.len()));

        sync.set_query("main");
        sync.on_listings(fixture());
        sync.reset();
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
        assert_eq!(sync.revision(), 2);

        assert!(sync.unsubscribe(id));
        assert!(!sync.unsubscribe(id));
        sync.set_query("oak");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn deliveries_after_unmount_are_discarded() {
        let mut sync = ListingSynchronizer::new();
        sync.on_listings(fixture());
        sync.unmount();

        assert_eq!(sync.on_listings(vec![]), Delivery::Discarded);
        sync.set_query("oak");
        assert_eq!(sync.projection(), &Projection::Loaded(fixture()));
        assert!(sync.predicates().is_default());
        assert!(!sync.is_mounted());
    }
}
