//! Thread-safe access to a [`ListingSynchronizer`].
//!
//! On a multi-threaded host, listing deliveries (from a background feed)
//! and predicate changes (from user input) can race. Routing both through
//! one mutex keeps the projection equal to "latest listings filtered by
//! latest predicates" regardless of interleaving.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apartment_spot_filter::models::{Minimum, PredicateSet};
use apartment_spot_listing_models::Listing;
use tokio::sync::mpsc;

use crate::{Delivery, ListingSynchronizer, Projection, ProjectionObserver, SubscriptionId};

/// A cloneable, lock-protected [`ListingSynchronizer`].
#[derive(Debug, Clone, Default)]
pub struct SharedSynchronizer {
    inner: Arc<Mutex<ListingSynchronizer>>,
}

impl SharedSynchronizer {
    /// Wraps a fresh synchronizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the synchronizer.
    ///
    /// A panic in an earlier holder does not make the synchronizer
    /// unusable; its state is always internally consistent between calls.
    pub fn with<T>(&self, f: impl FnOnce(&mut ListingSynchronizer) -> T) -> T {
        let mut guard: MutexGuard<'_, ListingSynchronizer> =
            self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// Snapshot of the current projection.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.with(|sync| sync.projection().clone())
    }

    /// Snapshot of the active predicates.
    #[must_use]
    pub fn predicates(&self) -> PredicateSet {
        self.with(|sync| sync.predicates().clone())
    }

    /// See [`ListingSynchronizer::on_listings`].
    pub fn on_listings(&self, listings: Vec<Listing>) -> Delivery {
        self.with(|sync| sync.on_listings(listings))
    }

    /// See [`ListingSynchronizer::set_query`].
    pub fn set_query(&self, query: impl Into<String>) {
        self.with(|sync| sync.set_query(query));
    }

    /// See [`ListingSynchronizer::set_price_range`].
    pub fn set_price_range(&self, min: f64, max: Option<f64>) {
        self.with(|sync| sync.set_price_range(min, max));
    }

    /// See [`ListingSynchronizer::set_min_bedrooms`].
    pub fn set_min_bedrooms(&self, min: Minimum<u32>) {
        self.with(|sync| sync.set_min_bedrooms(min));
    }

    /// See [`ListingSynchronizer::set_min_bathrooms`].
    pub fn set_min_bathrooms(&self, min: Minimum<f64>) {
        self.with(|sync| sync.set_min_bathrooms(min));
    }

    /// See [`ListingSynchronizer::set_predicates`].
    pub fn set_predicates(&self, predicates: PredicateSet) {
        self.with(|sync| sync.set_predicates(predicates));
    }

    /// See [`ListingSynchronizer::reset`].
    pub fn reset(&self) {
        self.with(ListingSynchronizer::reset);
    }

    /// See [`ListingSynchronizer::subscribe`].
    pub fn subscribe(&self, observer: impl ProjectionObserver + 'static) -> SubscriptionId {
        self.with(|sync| sync.subscribe(observer))
    }

    /// See [`ListingSynchronizer::unmount`].
    pub fn unmount(&self) {
        self.with(ListingSynchronizer::unmount);
    }

    /// Whether the synchronizer still accepts updates.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.with(|sync| sync.is_mounted())
    }
}

/// Applies every listing set received on `feed` until the channel closes
/// or the synchronizer is unmounted.
///
/// Returns the number of deliveries applied.
pub async fn drive_feed(
    sync: SharedSynchronizer,
    mut feed: mpsc::Receiver<Vec<Listing>>,
) -> usize {
    let mut applied = 0;

    while let Some(listings) = feed.recv().await {
        match sync.on_listings(listings) {
            Delivery::Applied => applied += 1,
            Delivery::Discarded => {
                log::debug!("Synchronizer unmounted, stopping feed");
                break;
            }
        }
    }

    log::debug!("Listing feed finished after {applied} deliveries");
    applied
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn listing(id: &str, bedrooms: u32) -> Listing {
        Listing {
            id: id.to_string(),
            landlord_id: String::new(),
            title: format!("Apartment {id}"),
            description: String::new(),
            address: format!("{id} Main St"),
            city: String::new(),
            latitude: None,
            longitude: None,
            price: 1000.0,
            bedrooms,
            bathrooms: 1.0,
            availability_date: None,
            photos: vec![],
            amenities: vec![],
            conditions: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn concurrent_updates_end_in_consistent_projection() {
        let sync = SharedSynchronizer::new();

        let feeder = {
            let sync = sync.clone();
            thread::spawn(move || {
                for round in 0..50u32 {
                    sync.on_listings(vec![listing("a", round % 4), listing("b", 2)]);
                }
            })
        };
        let filterer = {
            let sync = sync.clone();
            thread::spawn(move || {
                for round in 0..50u32 {
                    sync.set_min_bedrooms(Minimum::AtLeast(round % 3));
                }
            })
        };
        feeder.join().unwrap();
        filterer.join().unwrap();

        sync.with(|inner| {
            let expected = apartment_spot_filter::apply(
                inner.listings().unwrap(),
                inner.predicates(),
            );
            assert_eq!(inner.projection(), &Projection::Loaded(expected));
        });
    }

    #[tokio::test]
    async fn feed_deliveries_replace_listing_set() {
        let sync = SharedSynchronizer::new();
        sync.set_min_bedrooms(Minimum::AtLeast(2));

        let (tx, rx) = mpsc::channel(4);
        tx.send(vec![listing("a", 1)]).await.unwrap();
        tx.send(vec![listing("b", 2), listing("c", 3)]).await.unwrap();
        drop(tx);

        let applied = drive_feed(sync.clone(), rx).await;
        assert_eq!(applied, 2);
        assert_eq!(sync.projection().len(), 2);
    }

    #[tokio::test]
    async fn feed_stops_after_unmount() {
        let sync = SharedSynchronizer::new();
        let (tx, rx) = mpsc::channel(4);
        tx.send(vec![listing("a", 1)]).await.unwrap();

        let driver = tokio::spawn(drive_feed(sync.clone(), rx));
        tokio::task::yield_now().await;
        while !sync.projection().is_loaded() {
            tokio::task::yield_now().await;
        }

        sync.unmount();
        tx.send(vec![listing("b", 1), listing("c", 1)]).await.unwrap();

        assert_eq!(driver.await.unwrap(), 1);
        assert_eq!(sync.projection().len(), 1);
        assert!(!sync.is_mounted());
    }
}
