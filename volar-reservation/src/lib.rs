//! Reservation lifecycle controllers: the list screen, its per-row item
//! controllers, the booking flow and the session-aware tab gate.
//!
//! Controllers are cheap `Clone` handles. They never hold a lock across a
//! gateway call, so actions on the same row can overlap; each action only
//! guards against being triggered twice while in flight.

pub mod booking;
pub mod item;
pub mod list;
pub mod tabs;

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use volar_core::Alert;

pub use booking::{BookingController, BookingStage, BookingSummary};
pub use item::{DeletePrompt, DeleteState, EditState, ReservationItem, ReservationRow};
pub use list::{ListState, ReservationList};
pub use tabs::{Tab, TabGate};

/// Result of a user action on a controller.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action completed and state moved on.
    Applied,
    /// Not available in the current state, or already in flight.
    Ignored,
    /// Refused client-side; no request was issued.
    Rejected(Alert),
    /// The request failed; the previous state was restored.
    Failed(Alert),
    /// The owning view was torn down while the request was in flight.
    Cancelled,
}

impl Outcome {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Outcome::Rejected(alert) | Outcome::Failed(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Callback an item controller uses to ask its parent list to re-fetch.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
