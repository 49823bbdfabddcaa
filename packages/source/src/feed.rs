//! Push-based listing feed built on top of a pull-based [`ListingSource`].
//!
//! The feed task re-fetches the source on a fixed interval and sends each
//! complete snapshot over a bounded channel. A failed fetch is logged and
//! skipped; the previous snapshot stays authoritative on the receiving end.

use std::sync::Arc;
use std::time::Duration;

use apartment_spot_listing_models::Listing;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ListingSource;

/// Number of undelivered snapshots buffered before the feed waits.
const FEED_CAPACITY: usize = 4;

/// Spawns a task that polls `source` every `interval`, starting
/// immediately.
///
/// The task ends when the returned receiver is dropped.
#[must_use]
pub fn spawn_polling_feed(
    source: Arc<dyn ListingSource>,
    interval: Duration,
) -> (mpsc::Receiver<Vec<Listing>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(FEED_CAPACITY);
    let handle = tokio::spawn(poll(source, interval, tx));
    (rx, handle)
}

async fn poll(source: Arc<dyn ListingSource>, interval: Duration, tx: mpsc::Sender<Vec<Listing>>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sent = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = tx.closed() => break,
        }

        match source.fetch_listings().await {
            Ok(listings) => {
                log::debug!("{}: fetched {} listings", source.name(), listings.len());
                if tx.send(listings).await.is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => {
                log::warn!("{}: listing fetch failed, keeping previous snapshot: {e}", source.name());
            }
        }
    }

    log::debug!("{}: feed stopped after {sent} snapshots", source.name());
}
