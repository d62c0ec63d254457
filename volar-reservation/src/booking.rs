use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use volar_core::scope::run_scoped;
use volar_core::{
    Alert, FlightCatalog, Navigator, PassengerCount, PassengerLimit, ReservationError,
    ReservationGateway, Route, SessionStore,
};
use volar_shared::Flight;

use crate::{lock, Outcome};

pub const LOGIN_TO_BOOK: &str = "You must log in to make a reservation.";
pub const BOOKING_FAILED: &str = "Could not complete the booking. Please try again.";
pub const FLIGHT_LOAD_FAILED: &str = "Could not load the flight details. Please try again.";

/// Shown once a reservation has been created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSummary {
    pub reservation_id: i64,
    pub airline: String,
    pub route: String,
    pub passengers: PassengerCount,
}

impl BookingSummary {
    pub fn message(&self) -> String {
        format!(
            "Your reservation for {} passenger(s) has been placed.\nFlight: {}\nRoute: {}\nReservation code: {}",
            self.passengers, self.airline, self.route, self.reservation_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStage {
    Browsing,
    LoadingFlight,
    /// No session: the user picks "Cancel" or "Log in".
    LoginPrompt,
    Submitting,
    Booked(BookingSummary),
    /// Acknowledging the alert navigates to `then`, if set.
    Failed { alert: Alert, then: Option<Route> },
}

struct BookingState {
    flight: Option<Flight>,
    passengers: PassengerCount,
    stage: BookingStage,
}

/// Flight detail → booking flow.
///
/// The passenger selection here is independent of any reservation row and
/// obeys the same [`PassengerLimit`] as row edits.
pub struct BookingController {
    flight_id: i64,
    gateway: Arc<dyn ReservationGateway>,
    catalog: Arc<dyn FlightCatalog>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    scope: CancellationToken,
    limit: PassengerLimit,
    state: Mutex<BookingState>,
}

impl BookingController {
    pub fn new(
        flight_id: i64,
        gateway: Arc<dyn ReservationGateway>,
        catalog: Arc<dyn FlightCatalog>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            flight_id,
            gateway,
            catalog,
            session,
            navigator,
            scope: CancellationToken::new(),
            limit: PassengerLimit::default(),
            state: Mutex::new(BookingState {
                flight: None,
                passengers: PassengerCount::default(),
                stage: BookingStage::Browsing,
            }),
        }
    }

    pub fn with_passenger_limit(mut self, limit: PassengerLimit) -> Self {
        self.limit = limit;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BookingState> {
        lock(&self.state)
    }

    pub fn flight_id(&self) -> i64 {
        self.flight_id
    }

    pub fn flight(&self) -> Option<Flight> {
        self.lock().flight.clone()
    }

    pub fn passengers(&self) -> PassengerCount {
        self.lock().passengers
    }

    pub fn stage(&self) -> BookingStage {
        self.lock().stage.clone()
    }

    pub fn teardown(&self) {
        self.scope.cancel();
    }

    /// Fetches the flight shown above the booking controls.
    pub async fn load(&self) -> Outcome {
        {
            let mut state = self.lock();
            if state.stage != BookingStage::Browsing {
                return Outcome::Ignored;
            }
            state.stage = BookingStage::LoadingFlight;
        }

        let result = run_scoped(&self.scope, self.catalog.flight(self.flight_id)).await;
        if self.scope.is_cancelled() {
            return Outcome::Cancelled;
        }

        let mut state = self.lock();
        match result {
            Ok(flight) => {
                state.flight = Some(flight);
                state.stage = BookingStage::Browsing;
                Outcome::Applied
            }
            Err(ReservationError::Cancelled) => Outcome::Cancelled,
            Err(err) => {
                warn!(flight_id = self.flight_id, "Failed to load flight: {}", err);
                let alert = Alert::from_failure(FLIGHT_LOAD_FAILED, &err);
                state.stage = BookingStage::Failed {
                    alert: alert.clone(),
                    then: Some(Route::Back),
                };
                Outcome::Failed(alert)
            }
        }
    }

    /// Adds a passenger; past the maximum the selection is rejected with a
    /// notice instead of being clamped.
    pub fn increment_passengers(&self) -> Outcome {
        let mut state = self.lock();
        match self.limit.increment(state.passengers) {
            Ok(next) => {
                state.passengers = next;
                Outcome::Applied
            }
            Err(err) => Outcome::Rejected(Alert::info("Passenger limit", err.to_string())),
        }
    }

    pub fn decrement_passengers(&self) -> Outcome {
        let mut state = self.lock();
        state.passengers = state.passengers.decrement();
        Outcome::Applied
    }

    pub fn set_passengers(&self, count: u32) -> Outcome {
        match self.limit.count(count) {
            Ok(passengers) => {
                self.lock().passengers = passengers;
                Outcome::Applied
            }
            Err(err) => Outcome::Rejected(Alert::info("Passenger limit", err.to_string())),
        }
    }

    /// Submits a new `pending` reservation, or asks for a login when the
    /// session has no token.
    pub async fn book(&self) -> Outcome {
        let passengers = {
            let mut state = self.lock();
            if state.stage != BookingStage::Browsing {
                return Outcome::Ignored;
            }
            if self.session.token().is_none() {
                info!("Booking attempted without a session");
                state.stage = BookingStage::LoginPrompt;
                return Outcome::Rejected(Alert::info("Log in", LOGIN_TO_BOOK));
            }
            state.stage = BookingStage::Submitting;
            state.passengers
        };

        info!(flight_id = self.flight_id, passengers = passengers.get(), "Submitting booking");
        let result = run_scoped(&self.scope, self.gateway.create(self.flight_id, passengers)).await;
        if self.scope.is_cancelled() {
            return Outcome::Cancelled;
        }

        let mut state = self.lock();
        match result {
            Ok(reservation) => {
                let flight = state.flight.as_ref();
                let summary = BookingSummary {
                    reservation_id: reservation.id,
                    airline: flight.map_or("N/A", Flight::airline_name).to_string(),
                    route: flight.map_or_else(|| "N/A → N/A".to_string(), Flight::route),
                    passengers,
                };
                info!(reservation_id = reservation.id, "Booking placed");
                state.stage = BookingStage::Booked(summary);
                Outcome::Applied
            }
            Err(ReservationError::Cancelled) => Outcome::Cancelled,
            Err(ReservationError::Unauthenticated) => {
                state.stage = BookingStage::LoginPrompt;
                Outcome::Rejected(Alert::info("Log in", LOGIN_TO_BOOK))
            }
            Err(err) => {
                warn!(flight_id = self.flight_id, "Booking failed: {}", err);
                let alert = Alert::from_failure(BOOKING_FAILED, &err);
                state.stage = BookingStage::Failed {
                    alert: alert.clone(),
                    then: None,
                };
                Outcome::Failed(alert)
            }
        }
    }

    /// "Cancel" on the login prompt: nothing happens.
    pub fn cancel_login(&self) -> Outcome {
        let mut state = self.lock();
        if state.stage != BookingStage::LoginPrompt {
            return Outcome::Ignored;
        }
        state.stage = BookingStage::Browsing;
        Outcome::Applied
    }

    /// "Log in" on the login prompt: the attempt is abandoned, including the
    /// passenger selection.
    pub fn choose_login(&self) -> Outcome {
        {
            let mut state = self.lock();
            if state.stage != BookingStage::LoginPrompt {
                return Outcome::Ignored;
            }
            state.stage = BookingStage::Browsing;
            state.passengers = PassengerCount::default();
        }
        self.navigator.navigate(Route::Login);
        Outcome::Applied
    }

    /// Acknowledges the success summary or the failure alert.
    pub fn acknowledge(&self) -> Outcome {
        let next = {
            let mut state = self.lock();
            let next = match &state.stage {
                BookingStage::Booked(_) => Some(Route::Reservations),
                BookingStage::Failed { then, .. } => then.clone(),
                _ => return Outcome::Ignored,
            };
            state.stage = BookingStage::Browsing;
            next
        };
        if let Some(route) = next {
            self.navigator.navigate(route);
        }
        Outcome::Applied
    }
}

impl Drop for BookingController {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
