use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use volar_shared::{Flight, Reservation, ReservationStatus};

use crate::session::SessionStore;
use crate::{CoreResult, PassengerCount, ReservationError};

/// Authenticated access to the reservation collection.
///
/// No caching: callers re-fetch the list after every mutation.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    async fn list(&self) -> CoreResult<Vec<Reservation>>;

    /// Creates a `pending` reservation for the session's user.
    async fn create(&self, flight_id: i64, passengers: PassengerCount) -> CoreResult<Reservation>;

    async fn update(&self, id: i64, passengers: PassengerCount) -> CoreResult<Reservation>;

    async fn remove(&self, id: i64) -> CoreResult<()>;

    /// Payment confirmation: `pending → confirmed`.
    async fn confirm(&self, id: i64) -> CoreResult<Reservation>;
}

/// Read-only flight lookups for the booking flow.
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    async fn flight(&self, id: i64) -> CoreResult<Flight>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Remove,
    Confirm,
    Flight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    List,
    Create { flight_id: i64, passengers: u32 },
    Update { id: i64, passengers: u32 },
    Remove { id: i64 },
    Confirm { id: i64 },
    Flight { id: i64 },
}

#[derive(Default)]
struct MockState {
    reservations: Vec<Reservation>,
    flights: HashMap<i64, Flight>,
    next_id: i64,
    failures: HashMap<Operation, ReservationError>,
    stalled: HashSet<Operation>,
    calls: Vec<GatewayCall>,
}

/// In-memory stand-in for the reservation API.
///
/// Behaves like a well-formed server (ids, pricing, status rules) and can be
/// told to fail or hang on a given operation. Every request that would have
/// reached the network is recorded in [`MockGateway::calls`].
pub struct MockGateway {
    state: Mutex<MockState>,
    session: Option<Arc<dyn SessionStore>>,
    seat_price: f64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1,
                ..MockState::default()
            }),
            session: None,
            seat_price: 150.0,
        }
    }

    /// Rejects calls with `Unauthenticated` (without recording them) while the
    /// session has no token, like the HTTP gateway does.
    pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_reservations(self, reservations: Vec<Reservation>) -> Self {
        {
            let mut state = self.lock();
            state.next_id = reservations.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            state.reservations = reservations;
        }
        self
    }

    pub fn with_flight(self, flight: Flight) -> Self {
        self.lock().flights.insert(flight.id, flight);
        self
    }

    /// The next call of `op` fails with `err`.
    pub fn fail_next(&self, op: Operation, err: ReservationError) {
        self.lock().failures.insert(op, err);
    }

    /// Calls of `op` made from now on park until their scope is cancelled.
    pub fn stall(&self, op: Operation) {
        self.lock().stalled.insert(op);
    }

    /// Lets later calls of `op` through; already parked calls stay parked.
    pub fn release(&self, op: Operation) {
        self.lock().stalled.remove(&op);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.lock().reservations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shared prologue for every scripted call.
    async fn begin(&self, op: Operation, call: GatewayCall, authenticated: bool) -> CoreResult<()> {
        if authenticated {
            if let Some(session) = &self.session {
                if session.token().is_none() {
                    return Err(ReservationError::Unauthenticated);
                }
            }
        }

        let stalled = {
            let mut state = self.lock();
            state.calls.push(call);
            if let Some(err) = state.failures.remove(&op) {
                return Err(err);
            }
            state.stalled.contains(&op)
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn not_found(id: i64) -> ReservationError {
        ReservationError::Server {
            status: 404,
            message: format!("Reservation {} not found", id),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationGateway for MockGateway {
    async fn list(&self) -> CoreResult<Vec<Reservation>> {
        self.begin(Operation::List, GatewayCall::List, true).await?;
        Ok(self.reservations())
    }

    async fn create(&self, flight_id: i64, passengers: PassengerCount) -> CoreResult<Reservation> {
        let call = GatewayCall::Create { flight_id, passengers: passengers.get() };
        self.begin(Operation::Create, call, true).await?;

        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        let price = state
            .flights
            .get(&flight_id)
            .and_then(|f| f.price)
            .unwrap_or(self.seat_price);
        let reservation = Reservation {
            id,
            flight_id,
            passenger_count: passengers.get(),
            total_price: price * f64::from(passengers.get()),
            reservation_date: Some(chrono::Utc::now()),
            status: ReservationStatus::Pending,
            flight: state.flights.get(&flight_id).cloned(),
        };
        state.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update(&self, id: i64, passengers: PassengerCount) -> CoreResult<Reservation> {
        let call = GatewayCall::Update { id, passengers: passengers.get() };
        self.begin(Operation::Update, call, true).await?;

        let mut state = self.lock();
        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        let unit = reservation.total_price / f64::from(reservation.passenger_count.max(1));
        reservation.passenger_count = passengers.get();
        reservation.total_price = unit * f64::from(passengers.get());
        Ok(reservation.clone())
    }

    async fn remove(&self, id: i64) -> CoreResult<()> {
        self.begin(Operation::Remove, GatewayCall::Remove { id }, true).await?;

        let mut state = self.lock();
        let before = state.reservations.len();
        state.reservations.retain(|r| r.id != id);
        if state.reservations.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn confirm(&self, id: i64) -> CoreResult<Reservation> {
        self.begin(Operation::Confirm, GatewayCall::Confirm { id }, true).await?;

        let mut state = self.lock();
        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        if !reservation.status.can_transition_to(ReservationStatus::Confirmed) {
            return Err(ReservationError::Server {
                status: 409,
                message: format!("Reservation {} is already {}", id, reservation.status),
            });
        }
        reservation.status = ReservationStatus::Confirmed;
        Ok(reservation.clone())
    }
}

#[async_trait]
impl FlightCatalog for MockGateway {
    async fn flight(&self, id: i64) -> CoreResult<Flight> {
        self.begin(Operation::Flight, GatewayCall::Flight { id }, false).await?;

        self.lock().flights.get(&id).cloned().ok_or_else(|| ReservationError::Server {
            status: 404,
            message: format!("Flight {} not found", id),
        })
    }
}
