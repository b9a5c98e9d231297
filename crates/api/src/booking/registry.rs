//! Seat map registry: the valid seat coordinates of each dome.

use std::collections::BTreeSet;
use std::sync::Arc;

use moka::future::Cache;
use planetarium_core::{Dome, DomeId, Seat};
use tracing::instrument;

use super::{BookingError, SeatCatalog};

/// Looks up dome geometry and validates seats against it.
///
/// Dome geometry cannot change once sessions reference the dome, so found
/// domes are cached. Misses are never cached: a dome created later must
/// become visible.
pub struct SeatMapRegistry<C> {
    catalog: C,
    domes: Cache<DomeId, Arc<Dome>>,
}

impl<C: SeatCatalog> SeatMapRegistry<C> {
    /// Create a registry caching up to `capacity` domes.
    pub fn new(catalog: C, capacity: u64) -> Self {
        Self {
            catalog,
            domes: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// The underlying catalog.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Get the seat geometry of a dome.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::DomeNotFound` for an unknown dome.
    /// Returns `BookingError::Repository` if the catalog lookup fails.
    #[instrument(skip(self), fields(dome_id = %dome))]
    pub async fn seat_space(&self, dome: DomeId) -> Result<Arc<Dome>, BookingError> {
        if let Some(cached) = self.domes.get(&dome).await {
            return Ok(cached);
        }

        let found = self
            .catalog
            .get_dome(dome)
            .await?
            .ok_or(BookingError::DomeNotFound(dome))?;

        let found = Arc::new(found);
        self.domes.insert(dome, Arc::clone(&found)).await;
        Ok(found)
    }

    /// Whether `(row, seat_number)` exists in the dome.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::DomeNotFound` for an unknown dome.
    pub async fn is_valid_seat(
        &self,
        dome: DomeId,
        row: u16,
        seat_number: u16,
    ) -> Result<bool, BookingError> {
        Ok(self.seat_space(dome).await?.is_valid_seat(row, seat_number))
    }

    /// Every seat of the dome.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::DomeNotFound` for an unknown dome.
    pub async fn all_seats(&self, dome: DomeId) -> Result<BTreeSet<Seat>, BookingError> {
        Ok(self.seat_space(dome).await?.seats().collect())
    }
}
