//! One running search screen: a synchronizer feeding the grid and a
//! mounted map renderer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use apartment_spot_config::AppConfig;
use apartment_spot_filter::models::{Minimum, PredicateSet, PriceRange};
use apartment_spot_grid::GridView;
use apartment_spot_listing_models::Listing;
use apartment_spot_map::geolocation::{GeolocationProvider, locate_and_deliver};
use apartment_spot_map::surface::MemorySurface;
use apartment_spot_map::{GeolocationDelivery, MapError, MapRenderer, MountToken};
use apartment_spot_projection::{Delivery, Projection, SharedSynchronizer};

/// Currency symbol used on grid cards.
pub const GRID_CURRENCY: &str = "$";

/// Search criteria collected from flags or prompts.
#[derive(Debug, Clone, Default)]
pub struct Search {
    pub query: String,
    pub min_price: f64,
    /// `None` or exactly the slider maximum is unbounded.
    pub max_price: Option<f64>,
    pub min_bedrooms: Minimum<u32>,
    pub min_bathrooms: Minimum<f64>,
}

pub type SharedRenderer = Arc<Mutex<MapRenderer<MemorySurface>>>;

pub struct Session {
    config: AppConfig,
    sync: SharedSynchronizer,
    map: SharedRenderer,
    token: MountToken,
    located: AtomicBool,
}

impl Session {
    /// Mounts a map renderer and subscribes it to a fresh synchronizer so
    /// every projection change redraws the listing markers.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the renderer cannot be mounted.
    pub fn mount(config: AppConfig) -> Result<Self, MapError> {
        let mut renderer = MapRenderer::new(config.map.options());
        let token = renderer.mount(MemorySurface::new())?;
        let map = Arc::new(Mutex::new(renderer));

        let sync = SharedSynchronizer::new();
        let observer_map = Arc::clone(&map);
        sync.subscribe(move |projection: &Projection| {
            let Some(listings) = projection.listings() else {
                return;
            };
            let mut renderer = observer_map.lock().unwrap_or_else(PoisonError::into_inner);
            match renderer.refresh(listings) {
                Ok(refresh) => log::debug!(
                    "Map markers refreshed: {} drawn, {} skipped",
                    refresh.drawn,
                    refresh.skipped
                ),
                Err(e) => log::warn!("Map refresh skipped: {e}"),
            }
        });

        Ok(Self {
            config,
            sync,
            map,
            token,
            located: AtomicBool::new(false),
        })
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn sync(&self) -> &SharedSynchronizer {
        &self.sync
    }

    /// Delivers a complete listing snapshot.
    pub fn deliver(&self, listings: Vec<Listing>) -> Delivery {
        self.sync.on_listings(listings)
    }

    /// Replaces the active predicates with `search`.
    pub fn apply_search(&self, search: &Search) {
        let slider_max = self.config.filters.price_slider_max;
        let price = match search.max_price {
            Some(max) => PriceRange::from_slider(search.min_price, max, slider_max),
            None => PriceRange::new(search.min_price, None),
        };

        self.sync.set_predicates(PredicateSet {
            query: search.query.clone(),
            price,
            min_bedrooms: search.min_bedrooms,
            min_bathrooms: search.min_bathrooms,
        });
    }

    #[must_use]
    pub fn grid(&self) -> GridView {
        GridView::from_projection(
            &self.sync.projection(),
            GRID_CURRENCY,
            &self.config.map.detail_path_prefix,
        )
    }

    /// Runs `f` against the map renderer.
    pub fn with_map<T>(&self, f: impl FnOnce(&mut MapRenderer<MemorySurface>) -> T) -> T {
        let mut renderer = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *renderer)
    }

    /// Requests the user's position and hands it to the map.
    ///
    /// Only the first call per mount asks `provider`; later calls return
    /// [`GeolocationDelivery::Discarded`].
    pub async fn locate(&self, provider: Arc<dyn GeolocationProvider>) -> GeolocationDelivery {
        if self.located.swap(true, Ordering::SeqCst) {
            log::debug!("Geolocation already requested for this mount");
            return GeolocationDelivery::Discarded;
        }
        locate_and_deliver(
            Arc::clone(&self.map),
            self.token,
            provider,
            self.config.map.geolocation_timeout(),
        )
        .await
    }

    /// Tears the screen down: later listing deliveries and geolocation
    /// results are discarded.
    pub fn close(&self) {
        self.sync.unmount();
        self.with_map(MapRenderer::dispose);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
