#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map renderer for the filtered listing projection.
//!
//! [`MapRenderer`] keeps a map surface's markers in lockstep with the
//! current projection: one marker per listing that has a valid position,
//! plus at most one "you are here" marker once geolocation succeeds.
//!
//! The renderer moves through `Uninitialized -> Initialized -> Disposed`.
//! The surface and its tile layer are created once, on mount; projection
//! updates only refresh markers. Disposal releases every marker and the
//! surface, and anything that arrives afterwards (a late geolocation fix,
//! a projection update) is dropped without touching state.

pub mod geolocation;
pub mod surface;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use apartment_spot_listing_models::{GeoPosition, Listing};
use apartment_spot_map_models::{
    GeolocationOutcome, MapOptions, MapState, Marker, MarkerId, MarkerPopup, Viewport,
};

pub use apartment_spot_map_models as models;

use crate::surface::{MapSurface, SurfaceHandle};

/// Errors from map renderer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// `mount` was called on a renderer that already has a surface.
    #[error("map surface already initialized")]
    AlreadyInitialized,
    /// The renderer was disposed; it cannot be used again.
    #[error("map renderer has been disposed")]
    Disposed,
}

/// Identifies one mount of one renderer.
///
/// Asynchronous results (geolocation) carry the token of the mount that
/// requested them, so results meant for another renderer, or for a
/// renderer that has since been disposed, are recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountToken(u64);

static NEXT_MOUNT: AtomicU64 = AtomicU64::new(1);

impl MountToken {
    fn next() -> Self {
        Self(NEXT_MOUNT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Outcome of handing a geolocation result to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationDelivery {
    /// The user marker was placed or moved.
    Located {
        /// Whether the viewport was recentered on this fix.
        recentered: bool,
    },
    /// The request failed; the map keeps its fallback center and shows no
    /// user marker.
    Failed,
    /// The result was stale (wrong mount or disposed renderer) and ignored.
    Discarded,
}

/// Counts from a marker refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerRefresh {
    /// Listing markers now on the map.
    pub drawn: usize,
    /// Listings skipped for lack of a valid position.
    pub skipped: usize,
}

/// Renders the filtered projection onto a [`MapSurface`].
pub struct MapRenderer<S: MapSurface> {
    options: MapOptions,
    state: MapState,
    surface: Option<SurfaceHandle<S>>,
    token: Option<MountToken>,
    listing_markers: BTreeMap<String, Marker>,
    user_marker: Option<Marker>,
    viewport: Viewport,
    recentered: bool,
}

impl<S: MapSurface> MapRenderer<S> {
    /// Creates an uninitialized renderer centered on the fallback center.
    #[must_use]
    pub fn new(options: MapOptions) -> Self {
        let viewport = Viewport {
            center: options.fallback_center,
            zoom: options.zoom,
        };
        Self {
            options,
            state: MapState::Uninitialized,
            surface: None,
            token: None,
            listing_markers: BTreeMap::new(),
            user_marker: None,
            viewport,
            recentered: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MapState {
        self.state
    }

    /// Token of the current mount, if mounted.
    #[must_use]
    pub const fn token(&self) -> Option<MountToken> {
        self.token
    }

    /// The visible region.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The underlying surface, if one was mounted (it stays readable after
    /// disposal).
    #[must_use]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref().map(SurfaceHandle::surface)
    }

    /// Listing markers, ordered by listing id.
    pub fn listing_markers(&self) -> impl Iterator<Item = &Marker> {
        self.listing_markers.values()
    }

    /// Number of listing markers (the user marker is not counted).
    #[must_use]
    pub fn listing_marker_count(&self) -> usize {
        self.listing_markers.len()
    }

    /// The "you are here" marker, if geolocation succeeded.
    #[must_use]
    pub const fn user_marker(&self) -> Option<&Marker> {
        self.user_marker.as_ref()
    }

    /// Creates the map surface with its base tile layer and draws any
    /// markers computed before mounting.
    ///
    /// Returns the token that geolocation results for this mount must
    /// carry.
    ///
    /// # Errors
    ///
    /// * [`MapError::AlreadyInitialized`] if the renderer is already mounted
    /// * [`MapError::Disposed`] if the renderer was disposed
    pub fn mount(&mut self, surface: S) -> Result<MountToken, MapError> {
        match self.state {
            MapState::Initialized => return Err(MapError::AlreadyInitialized),
            MapState::Disposed => return Err(MapError::Disposed),
            MapState::Uninitialized => {}
        }

        let mut handle = SurfaceHandle::create(surface, self.viewport, &self.options.tile_layer);
        if let Some(surface) = handle.surface_mut() {
            for marker in self.listing_markers.values() {
                surface.add_marker(marker);
            }
        }

        let token = MountToken::next();
        self.surface = Some(handle);
        self.token = Some(token);
        self.state = MapState::Initialized;

        log::info!(
            "Map initialized at ({}, {}) zoom {} with {} listing markers",
            self.viewport.center.latitude,
            self.viewport.center.longitude,
            self.viewport.zoom,
            self.listing_markers.len()
        );

        Ok(token)
    }

    /// Replaces every listing marker with markers for `projection`.
    ///
    /// All previous listing markers are removed (the user marker is kept),
    /// then one marker is drawn per listing with a valid position. Listings
    /// without one are skipped silently. Before mounting, the markers are
    /// computed and drawn at mount time.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Disposed`] if the renderer was disposed.
    pub fn refresh(&mut self, projection: &[Listing]) -> Result<MarkerRefresh, MapError> {
        if self.state == MapState::Disposed {
            log::debug!("Ignoring projection update on disposed map");
            return Err(MapError::Disposed);
        }

        let mut surface = self.surface.as_mut().and_then(SurfaceHandle::surface_mut);
        if let Some(surface) = surface.as_deref_mut() {
            for id in self.listing_markers.keys() {
                surface.remove_marker(&MarkerId::Listing(id.clone()));
            }
        }
        self.listing_markers.clear();

        let mut refresh = MarkerRefresh::default();
        for listing in projection {
            let Some(marker) = Marker::for_listing(
                listing,
                &self.options.currency_symbol,
                &self.options.detail_path_prefix,
            ) else {
                refresh.skipped += 1;
                continue;
            };

            if let Some(surface) = surface.as_deref_mut() {
                surface.add_marker(&marker);
            }
            self.listing_markers.insert(listing.id.clone(), marker);
        }
        refresh.drawn = self.listing_markers.len();

        log::debug!(
            "Refreshed map markers: {} drawn, {} without coordinates",
            refresh.drawn,
            refresh.skipped
        );

        Ok(refresh)
    }

    /// Applies the result of this mount's geolocation request.
    ///
    /// On success the user marker is placed (or moved) and, on the first
    /// fix only, the view recenters on the user. Failures are logged and leave the map
    /// on its fallback center. Results for another mount, or arriving after
    /// disposal, are discarded.
    pub fn deliver_geolocation(
        &mut self,
        token: MountToken,
        outcome: GeolocationOutcome,
    ) -> GeolocationDelivery {
        if self.state != MapState::Initialized || self.token != Some(token) {
            log::debug!(
                "Discarding geolocation result for {token:?} (state {}, current {:?})",
                self.state,
                self.token
            );
            return GeolocationDelivery::Discarded;
        }

        let position = match outcome {
            Ok(position) => position,
            Err(e) => {
                log::warn!("Geolocation failed, keeping fallback center: {e}");
                return GeolocationDelivery::Failed;
            }
        };

        self.place_user_marker(position);

        let recentered = !self.recentered;
        if recentered {
            self.recentered = true;
            self.viewport = Viewport {
                center: position,
                zoom: self.options.zoom,
            };
            if let Some(surface) = self.surface.as_mut().and_then(SurfaceHandle::surface_mut) {
                surface.set_view(self.viewport);
            }
        }

        log::info!(
            "User located at ({}, {}){}",
            position.latitude,
            position.longitude,
            if recentered { ", recentered map" } else { "" }
        );

        GeolocationDelivery::Located { recentered }
    }

    fn place_user_marker(&mut self, position: GeoPosition) {
        let marker = Marker::for_user(position);
        if let Some(surface) = self.surface.as_mut().and_then(SurfaceHandle::surface_mut) {
            surface.remove_marker(&MarkerId::User);
            surface.add_marker(&marker);
        }
        self.user_marker = Some(marker);
    }

    /// Reveals the popup of the clicked marker and returns its content.
    ///
    /// For listing markers the popup carries the listing id and detail
    /// path, which the embedding UI uses to navigate.
    #[must_use]
    pub fn select_marker(&mut self, id: &MarkerId) -> Option<&MarkerPopup> {
        if self.state != MapState::Initialized {
            return None;
        }

        let marker = match id {
            MarkerId::User => self.user_marker.as_ref()?,
            MarkerId::Listing(listing_id) => self.listing_markers.get(listing_id)?,
        };

        if let Some(surface) = self.surface.as_mut().and_then(SurfaceHandle::surface_mut) {
            surface.open_popup(id);
        }

        Some(&marker.popup)
    }

    /// Releases every marker and the surface. Calling it again does
    /// nothing.
    pub fn dispose(&mut self) {
        if self.state == MapState::Disposed {
            return;
        }

        if let Some(surface) = self.surface.as_mut().and_then(SurfaceHandle::surface_mut) {
            for id in self.listing_markers.keys() {
                surface.remove_marker(&MarkerId::Listing(id.clone()));
            }
            if self.user_marker.is_some() {
                surface.remove_marker(&MarkerId::User);
            }
        }
        if let Some(handle) = self.surface.as_mut() {
            handle.dispose();
        }

        self.listing_markers.clear();
        self.user_marker = None;
        self.token = None;
        self.state = MapState::Disposed;

        log::info!("Map disposed");
    }
}
