use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::flight::Flight;

/// Reservation lifecycle status.
///
/// `Pending → Confirmed` on payment confirmation, `Pending | Confirmed → Cancelled`
/// on deletion. Nothing leaves `Cancelled`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    #[serde(alias = "pendiente", alias = "PENDING")]
    Pending,
    #[serde(alias = "confirmado", alias = "CONFIRMED")]
    Confirmed,
    #[serde(alias = "cancelado", alias = "canceled", alias = "CANCELLED")]
    Cancelled,
}

impl ReservationStatus {
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }

    /// Upper-case badge text shown on a reservation row.
    pub fn label(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        };
        f.write_str(value)
    }
}

fn one() -> u32 {
    1
}

/// A booking record linking the session's user, a flight, a passenger count
/// and a lifecycle status.
///
/// Only `id` is mandatory on the wire: confirmation responses are frequently
/// partial (`{"id": 1, "status": "confirmed"}`), and the list is re-fetched
/// after every mutation anyway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    #[serde(deserialize_with = "super::de_id")]
    pub id: i64,
    #[serde(default, alias = "flightId")]
    pub flight_id: i64,
    #[serde(default = "one", alias = "passengerCount")]
    pub passenger_count: u32,
    /// Computed by the server; never recomputed locally.
    #[serde(default, alias = "totalPrice", deserialize_with = "super::de_price")]
    pub total_price: f64,
    #[serde(default, alias = "reservationDate")]
    pub reservation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight: Option<Flight>,
}

/// Body of a successful create. Servers answer with the full row, with a bare
/// `{"bookingId": ..}`, or with both ids, and either id may be a string.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CreatedReservation {
    #[serde(default, deserialize_with = "super::de_opt_id")]
    pub id: Option<i64>,
    #[serde(default, rename = "bookingId", alias = "booking_id", deserialize_with = "super::de_opt_id")]
    pub booking_id: Option<i64>,
    #[serde(default, alias = "flightId")]
    pub flight_id: Option<i64>,
    #[serde(default, alias = "passengerCount")]
    pub passenger_count: Option<u32>,
    #[serde(default, alias = "totalPrice", deserialize_with = "super::de_opt_price")]
    pub total_price: Option<f64>,
    #[serde(default, alias = "reservationDate")]
    pub reservation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub flight: Option<Flight>,
}

impl CreatedReservation {
    /// `id` wins over `bookingId` when both are present.
    pub fn reservation_id(&self) -> Option<i64> {
        self.id.or(self.booking_id)
    }

    /// Completes the record from the request that created it. `None` when the
    /// server sent no identifier at all.
    pub fn into_reservation(self, flight_id: i64, passenger_count: u32) -> Option<Reservation> {
        let id = self.reservation_id()?;
        Some(Reservation {
            id,
            flight_id: self.flight_id.unwrap_or(flight_id),
            passenger_count: self.passenger_count.unwrap_or(passenger_count),
            total_price: self.total_price.unwrap_or_default(),
            reservation_date: self.reservation_date,
            status: self.status.unwrap_or_default(),
            flight: self.flight,
        })
    }
}
