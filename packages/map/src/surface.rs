//! Map surface abstraction.
//!
//! A [`MapSurface`] is whatever actually draws the map (a browser map
//! widget, a native view, a test double). The renderer only talks to it
//! through this trait, and only through a [`SurfaceHandle`], which
//! disposes the surface when dropped so that a renderer going away never
//! leaks markers or the surface itself.

use std::collections::BTreeMap;

use apartment_spot_map_models::{Marker, MarkerId, TileLayer, Viewport};

/// Rendering backend for a single map view.
pub trait MapSurface {
    /// Creates the map surface and its base tile layer.
    fn create(&mut self, viewport: Viewport, tiles: &TileLayer);

    /// Moves the visible region.
    fn set_view(&mut self, viewport: Viewport);

    /// Draws a marker. A marker with the same id replaces the old one.
    fn add_marker(&mut self, marker: &Marker);

    /// Removes a marker. Unknown ids are ignored.
    fn remove_marker(&mut self, id: &MarkerId);

    /// Reveals a marker's popup.
    fn open_popup(&mut self, id: &MarkerId);

    /// Releases the surface and every marker on it.
    fn dispose(&mut self);
}

/// Scoped ownership of a [`MapSurface`].
///
/// Created when a renderer mounts; disposing happens exactly once, either
/// explicitly through [`SurfaceHandle::dispose`] or on drop.
pub struct SurfaceHandle<S: MapSurface> {
    surface: S,
    disposed: bool,
}

impl<S: MapSurface> SurfaceHandle<S> {
    /// Takes ownership of `surface` and creates it with the given view.
    pub fn create(mut surface: S, viewport: Viewport, tiles: &TileLayer) -> Self {
        surface.create(viewport, tiles);
        Self {
            surface,
            disposed: false,
        }
    }

    /// The wrapped surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the wrapped surface, or `None` once disposed.
    pub const fn surface_mut(&mut self) -> Option<&mut S> {
        if self.disposed {
            None
        } else {
            Some(&mut self.surface)
        }
    }

    /// Whether the surface has been released.
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Releases the surface. Subsequent calls do nothing.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.surface.dispose();
            self.disposed = true;
        }
    }
}

impl<S: MapSurface> Drop for SurfaceHandle<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// In-memory [`MapSurface`] that records what would be on screen.
///
/// Used by the CLI to print the marker set and by tests to check the
/// renderer's invariants.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    markers: BTreeMap<MarkerId, Marker>,
    viewport: Option<Viewport>,
    tiles: Option<TileLayer>,
    open_popup: Option<MarkerId>,
    create_count: usize,
    disposed: bool,
}

impl MemorySurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently drawn, ordered by id.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    /// Looks up a drawn marker.
    #[must_use]
    pub fn marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.get(id)
    }

    /// Number of drawn markers, including the user marker.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Current view, if the surface was created.
    #[must_use]
    pub const fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Base tile layer, if the surface was created.
    #[must_use]
    pub const fn tile_layer(&self) -> Option<&TileLayer> {
        self.tiles.as_ref()
    }

    /// Marker whose popup is open.
    #[must_use]
    pub const fn opened_popup(&self) -> Option<&MarkerId> {
        self.open_popup.as_ref()
    }

    /// How many times [`MapSurface::create`] was called.
    #[must_use]
    pub const fn create_count(&self) -> usize {
        self.create_count
    }

    /// Whether [`MapSurface::dispose`] was called.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl MapSurface for MemorySurface {
    fn create(&mut self, viewport: Viewport, tiles: &TileLayer) {
        self.viewport = Some(viewport);
        self.tiles = Some(tiles.clone());
        self.create_count += 1;
    }

    fn set_view(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.markers.insert(marker.id.clone(), marker.clone());
    }

    fn remove_marker(&mut self, id: &MarkerId) {
        self.markers.remove(id);
        if self.open_popup.as_ref() == Some(id) {
            self.open_popup = None;
        }
    }

    fn open_popup(&mut self, id: &MarkerId) {
        if self.markers.contains_key(id) {
            self.open_popup = Some(id.clone());
        }
    }

    fn dispose(&mut self) {
        self.markers.clear();
        self.open_popup = None;
        self.tiles = None;
        self.disposed = true;
    }
}
