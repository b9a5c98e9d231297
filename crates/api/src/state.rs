//! Application state shared across handlers.

use std::sync::Arc;

use crate::booking::ReservationService;
use crate::config::ApiConfig;
use crate::storage::Storage;

/// The booking service as wired for the API.
pub type Booking = ReservationService<Storage, Storage>;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Owns the single booking service instance, so
/// every request shares one seat map cache and one set of session locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    storage: Storage,
    booking: Booking,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: &ApiConfig, storage: Storage) -> Self {
        let booking = ReservationService::new(
            storage.clone(),
            storage.clone(),
            config.booking_options(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                storage,
                booking,
            }),
        }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// Get a reference to the booking service.
    #[must_use]
    pub fn booking(&self) -> &Booking {
        &self.inner.booking
    }
}
