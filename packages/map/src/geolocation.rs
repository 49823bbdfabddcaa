//! Device geolocation.
//!
//! A [`GeolocationProvider`] answers a single position request, exactly
//! once, with either a position or a [`GeolocationError`]. Requests never
//! block listing markers: the renderer draws them immediately and applies
//! the geolocation outcome whenever it arrives.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use apartment_spot_listing_models::GeoPosition;
use apartment_spot_map_models::{GeolocationError, GeolocationOutcome};
use async_trait::async_trait;

use crate::surface::MapSurface;
use crate::{GeolocationDelivery, MapRenderer, MountToken};

/// Source of the device's current position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Resolves the current position once.
    async fn current_position(&self) -> GeolocationOutcome;
}

/// Provider that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    position: GeoPosition,
}

impl FixedGeolocation {
    /// Creates a provider reporting `position`.
    #[must_use]
    pub const fn new(position: GeoPosition) -> Self {
        Self { position }
    }

    /// Creates a provider from raw coordinates, rejecting invalid ones.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError::InvalidPosition`] if the coordinates are
    /// out of range or not finite.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self, GeolocationError> {
        GeoPosition::new(latitude, longitude)
            .map(Self::new)
            .ok_or_else(|| GeolocationError::InvalidPosition {
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
            })
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self) -> GeolocationOutcome {
        Ok(self.position)
    }
}

/// Provider that always fails with the configured error (e.g. a host
/// without location support, or a user who denied permission).
#[derive(Debug, Clone)]
pub struct UnavailableGeolocation {
    error: GeolocationError,
}

impl UnavailableGeolocation {
    /// Creates a provider failing with `error`.
    #[must_use]
    pub const fn new(error: GeolocationError) -> Self {
        Self { error }
    }

    /// Provider simulating a denied permission prompt.
    #[must_use]
    pub const fn denied() -> Self {
        Self::new(GeolocationError::PermissionDenied)
    }
}

#[async_trait]
impl GeolocationProvider for UnavailableGeolocation {
    async fn current_position(&self) -> GeolocationOutcome {
        Err(self.error.clone())
    }
}

/// Requests a position, giving up after `timeout`.
pub async fn request_position(
    provider: &dyn GeolocationProvider,
    timeout: Duration,
) -> GeolocationOutcome {
    tokio::time::timeout(timeout, provider.current_position())
        .await
        .unwrap_or(Err(GeolocationError::Timeout))
}

/// Requests a position and hands the outcome to the renderer that issued
/// `token`.
///
/// The renderer lock is only taken once the request resolves, so listing
/// updates proceed while the request is pending. If the renderer was
/// disposed in the meantime the outcome is discarded.
pub async fn locate_and_deliver<S: MapSurface + Send>(
    renderer: Arc<Mutex<MapRenderer<S>>>,
    token: MountToken,
    provider: Arc<dyn GeolocationProvider>,
    timeout: Duration,
) -> GeolocationDelivery {
    let outcome = request_position(provider.as_ref(), timeout).await;

    match renderer.lock() {
        Ok(mut renderer) => renderer.deliver_geolocation(token, outcome),
        Err(e) => {
            log::warn!("Map renderer lock poisoned, dropping geolocation result: {e}");
            GeolocationDelivery::Discarded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverResolves;

    #[async_trait]
    impl GeolocationProvider for NeverResolves {
        async fn current_position(&self) -> GeolocationOutcome {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn fixed_provider_reports_position() {
        let provider = FixedGeolocation::from_coordinates(26.85, 80.95).unwrap();
        let position = request_position(&provider, Duration::from_secs(1))
            .await
            .unwrap();
        assert!((position.latitude - 26.85).abs() < f64::EPSILON);
    }

    #[test]
    fn fixed_provider_rejects_invalid_coordinates() {
        assert!(matches!(
            FixedGeolocation::from_coordinates(95.0, 0.0),
            Err(GeolocationError::InvalidPosition { .. })
        ));
    }

    #[tokio::test]
    async fn denied_provider_reports_denial() {
        let outcome = request_position(&UnavailableGeolocation::denied(), Duration::from_secs(1)).await;
        assert_eq!(outcome, Err(GeolocationError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let outcome = request_position(&NeverResolves, Duration::from_secs(10)).await;
        assert_eq!(outcome, Err(GeolocationError::Timeout));
    }
}
