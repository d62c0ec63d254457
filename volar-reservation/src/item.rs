use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use volar_core::scope::run_scoped;
use volar_core::{Alert, PassengerCount, PassengerLimit, ReservationError, ReservationGateway};
use volar_shared::{Reservation, ReservationStatus};

use crate::{lock, Outcome, Refresh};

pub const UPDATE_FAILED: &str = "Could not update the reservation.";
pub const DELETE_FAILED: &str = "Could not delete the reservation.";
pub const CONFIRM_FAILED: &str = "Could not confirm the reservation.";

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
const UNKNOWN: &str = "N/A";

/// Passenger edit dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Closed,
    Open { draft: PassengerCount },
    Submitting { draft: PassengerCount },
}

/// Delete confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    Closed,
    ConfirmOpen,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteChoice {
    Cancel,
    Delete,
}

/// Confirmation shown before a reservation is deleted. Defaults to `Cancel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub title: &'static str,
    pub message: &'static str,
    pub choices: [DeleteChoice; 2],
    pub default_choice: DeleteChoice,
}

impl Default for DeletePrompt {
    fn default() -> Self {
        Self {
            title: "Confirm deletion",
            message: "Are you sure you want to cancel this reservation?",
            choices: [DeleteChoice::Cancel, DeleteChoice::Delete],
            default_choice: DeleteChoice::Cancel,
        }
    }
}

/// Display-ready snapshot of one reservation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRow {
    pub id: i64,
    pub airline: String,
    pub route: String,
    pub departure: String,
    pub arrival: String,
    /// Flight artwork, when the server sent one.
    pub image_url: Option<String>,
    pub passengers: u32,
    pub total_price: String,
    pub status: &'static str,
    pub can_confirm: bool,
    pub busy: bool,
}

struct ItemState {
    reservation: Reservation,
    edit: EditState,
    delete: DeleteState,
    confirming: bool,
    alert: Option<Alert>,
}

impl ItemState {
    fn busy(&self) -> bool {
        matches!(self.edit, EditState::Submitting { .. })
            || self.delete == DeleteState::Deleting
            || self.confirming
    }
}

struct ItemInner {
    gateway: Arc<dyn ReservationGateway>,
    on_change: Arc<dyn Refresh>,
    scope: CancellationToken,
    limit: PassengerLimit,
    state: Mutex<ItemState>,
}

/// Per-row controller: passenger edit, delete with confirmation, and payment
/// confirmation. Successful mutations never touch the local snapshot; they ask
/// the parent list to re-fetch, and the row changes when that data arrives.
#[derive(Clone)]
pub struct ReservationItem {
    inner: Arc<ItemInner>,
}

impl ReservationItem {
    pub fn new(
        reservation: Reservation,
        gateway: Arc<dyn ReservationGateway>,
        on_change: Arc<dyn Refresh>,
        scope: CancellationToken,
        limit: PassengerLimit,
    ) -> Self {
        Self {
            inner: Arc::new(ItemInner {
                gateway,
                on_change,
                scope,
                limit,
                state: Mutex::new(ItemState {
                    reservation,
                    edit: EditState::Closed,
                    delete: DeleteState::Closed,
                    confirming: false,
                    alert: None,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ItemState> {
        lock(&self.inner.state)
    }

    pub fn id(&self) -> i64 {
        self.lock().reservation.id
    }

    pub fn reservation(&self) -> Reservation {
        self.lock().reservation.clone()
    }

    pub fn edit_state(&self) -> EditState {
        self.lock().edit
    }

    pub fn delete_state(&self) -> DeleteState {
        self.lock().delete
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy()
    }

    /// Pending alert for the front-end to present, cleared on read.
    pub fn take_alert(&self) -> Option<Alert> {
        self.lock().alert.take()
    }

    /// Confirm is offered only while the reservation can still become confirmed.
    pub fn can_confirm(&self) -> bool {
        self.lock()
            .reservation
            .status
            .can_transition_to(ReservationStatus::Confirmed)
    }

    pub fn view(&self) -> ReservationRow {
        let state = self.lock();
        let r = &state.reservation;
        let flight = r.flight.as_ref();
        let format_time = |time: Option<chrono::DateTime<chrono::Utc>>| {
            time.map(|t| t.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };

        ReservationRow {
            id: r.id,
            airline: flight.map_or(UNKNOWN, |f| f.airline_name()).to_string(),
            route: flight.map_or_else(|| format!("{} → {}", UNKNOWN, UNKNOWN), |f| f.route()),
            departure: format_time(flight.and_then(|f| f.departure_datetime)),
            arrival: format_time(flight.and_then(|f| f.arrival_datetime)),
            image_url: flight.and_then(|f| f.image_url.clone()),
            passengers: r.passenger_count,
            total_price: format!("${:.2}", r.total_price),
            status: r.status.label(),
            can_confirm: r.status.can_transition_to(ReservationStatus::Confirmed),
            busy: state.busy(),
        }
    }

    /// Replaces the snapshot with freshly fetched data. Open dialogs keep
    /// their draft.
    pub(crate) fn sync(&self, reservation: Reservation) {
        self.lock().reservation = reservation;
    }

    /// Abandons any in-flight request of this row.
    pub fn teardown(&self) {
        self.inner.scope.cancel();
    }

    // ── Edit ────────────────────────────────────────────────────────────

    pub fn open_edit(&self) -> Outcome {
        let mut state = self.lock();
        if state.edit != EditState::Closed {
            return Outcome::Ignored;
        }
        let draft = self.inner.limit.clamp(state.reservation.passenger_count);
        state.edit = EditState::Open { draft };
        Outcome::Applied
    }

    pub fn increment_draft(&self) -> Outcome {
        let mut state = self.lock();
        let EditState::Open { draft } = state.edit else {
            return Outcome::Ignored;
        };
        match self.inner.limit.increment(draft) {
            Ok(next) => {
                state.edit = EditState::Open { draft: next };
                Outcome::Applied
            }
            Err(err) => {
                let alert = Alert::info("Passenger limit", err.to_string());
                state.alert = Some(alert.clone());
                Outcome::Rejected(alert)
            }
        }
    }

    pub fn decrement_draft(&self) -> Outcome {
        let mut state = self.lock();
        let EditState::Open { draft } = state.edit else {
            return Outcome::Ignored;
        };
        state.edit = EditState::Open {
            draft: draft.decrement(),
        };
        Outcome::Applied
    }

    /// Direct entry of a passenger count; out-of-range values are rejected
    /// and the draft stays as it was.
    pub fn set_draft(&self, count: u32) -> Outcome {
        let mut state = self.lock();
        if !matches!(state.edit, EditState::Open { .. }) {
            return Outcome::Ignored;
        }
        match self.inner.limit.count(count) {
            Ok(draft) => {
                state.edit = EditState::Open { draft };
                Outcome::Applied
            }
            Err(err) => {
                let alert = Alert::info("Passenger limit", err.to_string());
                state.alert = Some(alert.clone());
                Outcome::Rejected(alert)
            }
        }
    }

    pub fn cancel_edit(&self) -> Outcome {
        let mut state = self.lock();
        match state.edit {
            EditState::Open { .. } => {
                state.edit = EditState::Closed;
                Outcome::Applied
            }
            _ => Outcome::Ignored,
        }
    }

    /// `Open → Submitting → Closed` on success (then the list re-fetches);
    /// back to `Open` with the same draft on failure.
    pub async fn submit_edit(&self) -> Outcome {
        let (id, draft) = {
            let mut state = self.lock();
            let EditState::Open { draft } = state.edit else {
                return Outcome::Ignored;
            };
            state.edit = EditState::Submitting { draft };
            (state.reservation.id, draft)
        };

        debug!(reservation_id = id, passengers = draft.get(), "Submitting passenger change");
        let result = run_scoped(&self.inner.scope, self.inner.gateway.update(id, draft)).await;
        if self.inner.scope.is_cancelled() {
            return Outcome::Cancelled;
        }

        match result {
            Ok(_) => {
                self.lock().edit = EditState::Closed;
                info!(reservation_id = id, "Passenger count updated");
                self.inner.on_change.refresh().await;
                Outcome::Applied
            }
            Err(ReservationError::Cancelled) => Outcome::Cancelled,
            Err(err) => {
                warn!(reservation_id = id, "Passenger update failed: {}", err);
                let alert = Alert::from_failure(UPDATE_FAILED, &err);
                let mut state = self.lock();
                state.edit = EditState::Open { draft };
                state.alert = Some(alert.clone());
                Outcome::Failed(alert)
            }
        }
    }

    // ── Delete ──────────────────────────────────────────────────────────

    /// Opens the confirmation dialog. `None` while it is already open or a
    /// deletion is running.
    pub fn request_delete(&self) -> Option<DeletePrompt> {
        let mut state = self.lock();
        if state.delete != DeleteState::Closed {
            return None;
        }
        state.delete = DeleteState::ConfirmOpen;
        Some(DeletePrompt::default())
    }

    pub fn dismiss_delete(&self) -> Outcome {
        let mut state = self.lock();
        if state.delete != DeleteState::ConfirmOpen {
            return Outcome::Ignored;
        }
        state.delete = DeleteState::Closed;
        Outcome::Applied
    }

    /// Deletes after confirmation. The row stays visible until the list
    /// re-fetch no longer contains it.
    pub async fn confirm_delete(&self) -> Outcome {
        let id = {
            let mut state = self.lock();
            if state.delete != DeleteState::ConfirmOpen {
                return Outcome::Ignored;
            }
            state.delete = DeleteState::Deleting;
            state.reservation.id
        };

        let result = run_scoped(&self.inner.scope, self.inner.gateway.remove(id)).await;
        if self.inner.scope.is_cancelled() {
            return Outcome::Cancelled;
        }

        match result {
            Ok(()) => {
                self.lock().delete = DeleteState::Closed;
                info!(reservation_id = id, "Reservation deleted");
                self.inner.on_change.refresh().await;
                Outcome::Applied
            }
            Err(ReservationError::Cancelled) => Outcome::Cancelled,
            Err(err) => {
                warn!(reservation_id = id, "Reservation delete failed: {}", err);
                let alert = Alert::from_failure(DELETE_FAILED, &err);
                let mut state = self.lock();
                state.delete = DeleteState::Closed;
                state.alert = Some(alert.clone());
                Outcome::Failed(alert)
            }
        }
    }

    // ── Confirm payment ─────────────────────────────────────────────────

    pub async fn confirm_payment(&self) -> Outcome {
        let id = {
            let mut state = self.lock();
            let confirmable = state
                .reservation
                .status
                .can_transition_to(ReservationStatus::Confirmed);
            if state.confirming || !confirmable {
                return Outcome::Ignored;
            }
            state.confirming = true;
            state.reservation.id
        };

        let result = run_scoped(&self.inner.scope, self.inner.gateway.confirm(id)).await;
        if self.inner.scope.is_cancelled() {
            return Outcome::Cancelled;
        }

        match result {
            Ok(_) => {
                self.lock().confirming = false;
                info!(reservation_id = id, "Payment confirmed");
                self.inner.on_change.refresh().await;
                Outcome::Applied
            }
            Err(ReservationError::Cancelled) => Outcome::Cancelled,
            Err(err) => {
                warn!(reservation_id = id, "Payment confirmation failed: {}", err);
                let alert = Alert::from_failure(CONFIRM_FAILED, &err);
                let mut state = self.lock();
                state.confirming = false;
                state.alert = Some(alert.clone());
                Outcome::Failed(alert)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use volar_core::gateway::{GatewayCall, MockGateway, Operation};

    #[derive(Default)]
    struct CountingRefresh(AtomicUsize);

    #[async_trait]
    impl Refresh for CountingRefresh {
        async fn refresh(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn reservation(id: i64, passengers: u32, status: ReservationStatus) -> Reservation {
        Reservation {
            id,
            flight_id: 3,
            passenger_count: passengers,
            total_price: 150.0 * f64::from(passengers),
            reservation_date: None,
            status,
            flight: None,
        }
    }

    fn item_with(r: Reservation) -> (ReservationItem, Arc<MockGateway>, Arc<CountingRefresh>) {
        item_limited(r, PassengerLimit::default())
    }

    fn item_limited(
        r: Reservation,
        limit: PassengerLimit,
    ) -> (ReservationItem, Arc<MockGateway>, Arc<CountingRefresh>) {
        let gateway = Arc::new(MockGateway::new().with_reservations(vec![r.clone()]));
        let refresh = Arc::new(CountingRefresh::default());
        let item = ReservationItem::new(
            r,
            gateway.clone(),
            refresh.clone(),
            CancellationToken::new(),
            limit,
        );
        (item, gateway, refresh)
    }

    #[tokio::test]
    async fn test_edit_submit_closes_and_refreshes() {
        let (item, gateway, refresh) = item_with(reservation(1, 2, ReservationStatus::Pending));

        assert_eq!(item.open_edit(), Outcome::Applied);
        assert_eq!(item.edit_state(), EditState::Open { draft: PassengerCount::new(2).unwrap() });
        assert_eq!(item.increment_draft(), Outcome::Applied);

        assert_eq!(item.submit_edit().await, Outcome::Applied);
        assert_eq!(item.edit_state(), EditState::Closed);
        assert_eq!(refresh.0.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.calls(), vec![GatewayCall::Update { id: 1, passengers: 3 }]);
        // Snapshot only changes through the list re-fetch
        assert_eq!(item.reservation().passenger_count, 2);
    }

    #[tokio::test]
    async fn test_edit_failure_keeps_dialog_open_with_draft() {
        let (item, gateway, refresh) = item_with(reservation(1, 2, ReservationStatus::Pending));
        gateway.fail_next(Operation::Update, ReservationError::Network("timeout".into()));

        let _ = item.open_edit();
        let _ = item.decrement_draft();
        let outcome = item.submit_edit().await;

        assert!(matches!(outcome, Outcome::Failed(ref a) if a.message == UPDATE_FAILED));
        assert_eq!(item.edit_state(), EditState::Open { draft: PassengerCount::new(1).unwrap() });
        assert_eq!(refresh.0.load(Ordering::SeqCst), 0);
        assert!(item.take_alert().is_some());
        assert!(item.take_alert().is_none());

        // Retry from the still-open dialog succeeds
        assert_eq!(item.submit_edit().await, Outcome::Applied);
    }

    #[tokio::test]
    async fn test_draft_bounds_are_enforced_without_requests() {
        let (item, gateway, _) = item_with(reservation(1, 10, ReservationStatus::Pending));

        let _ = item.open_edit();
        assert!(matches!(item.increment_draft(), Outcome::Rejected(_)));
        assert!(matches!(item.set_draft(11), Outcome::Rejected(_)));
        assert!(matches!(item.set_draft(0), Outcome::Rejected(_)));
        assert_eq!(item.edit_state(), EditState::Open { draft: PassengerCount::new(10).unwrap() });

        let _ = item.set_draft(1);
        assert_eq!(item.decrement_draft(), Outcome::Applied);
        assert_eq!(item.edit_state(), EditState::Open { draft: PassengerCount::new(1).unwrap() });
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_edit_issues_no_request() {
        let (item, gateway, _) = item_with(reservation(1, 2, ReservationStatus::Pending));
        assert_eq!(item.submit_edit().await, Outcome::Ignored);
        let _ = item.open_edit();
        assert_eq!(item.cancel_edit(), Outcome::Applied);
        assert_eq!(item.edit_state(), EditState::Closed);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (item, gateway, refresh) = item_with(reservation(4, 1, ReservationStatus::Confirmed));

        assert_eq!(item.confirm_delete().await, Outcome::Ignored);
        let prompt = item.request_delete().unwrap();
        assert_eq!(prompt.default_choice, DeleteChoice::Cancel);
        assert!(item.request_delete().is_none());

        assert_eq!(item.dismiss_delete(), Outcome::Applied);
        assert_eq!(gateway.call_count(), 0);

        let _ = item.request_delete();
        assert_eq!(item.confirm_delete().await, Outcome::Applied);
        assert_eq!(item.delete_state(), DeleteState::Closed);
        assert_eq!(refresh.0.load(Ordering::SeqCst), 1);
        assert!(gateway.reservations().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_row_unchanged() {
        let original = reservation(1, 2, ReservationStatus::Pending);
        let (item, gateway, refresh) = item_with(original.clone());
        gateway.fail_next(
            Operation::Remove,
            ReservationError::Server { status: 500, message: String::new() },
        );

        let _ = item.request_delete();
        let outcome = item.confirm_delete().await;

        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(item.reservation(), original);
        assert_eq!(item.delete_state(), DeleteState::Closed);
        assert_eq!(refresh.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_hidden_and_ignored_once_confirmed() {
        let (item, gateway, _) = item_with(reservation(1, 2, ReservationStatus::Confirmed));
        assert!(!item.view().can_confirm);
        assert_eq!(item.confirm_payment().await, Outcome::Ignored);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_confirm_failure_surfaces_server_detail() {
        let (item, gateway, _) = item_with(reservation(1, 2, ReservationStatus::Pending));
        gateway.fail_next(
            Operation::Confirm,
            ReservationError::Server { status: 402, message: "Payment declined".into() },
        );

        let outcome = item.confirm_payment().await;
        let alert = outcome.alert().cloned().unwrap();
        assert_eq!(alert.message, CONFIRM_FAILED);
        assert_eq!(alert.detail.as_deref(), Some("Payment declined"));
        assert_eq!(item.reservation().status, ReservationStatus::Pending);
        assert!(!item.is_busy());
    }

    #[tokio::test]
    async fn test_repeated_trigger_is_ignored_while_in_flight() {
        let (item, gateway, _) = item_with(reservation(1, 2, ReservationStatus::Pending));
        gateway.stall(Operation::Confirm);

        let first = tokio::spawn({
            let item = item.clone();
            async move { item.confirm_payment().await }
        });
        tokio::task::yield_now().await;
        while !item.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(item.confirm_payment().await, Outcome::Ignored);
        assert!(item.view().busy);

        item.teardown();
        assert_eq!(first.await.unwrap(), Outcome::Cancelled);
        assert_eq!(gateway.calls(), vec![GatewayCall::Confirm { id: 1 }]);
    }

    #[test]
    fn test_row_view_formats_money_and_status() {
        let (item, _, _) = item_with(reservation(1, 2, ReservationStatus::Pending));
        let row = item.view();
        assert_eq!(row.passengers, 2);
        assert_eq!(row.total_price, "$300.00");
        assert_eq!(row.status, "PENDING");
        assert_eq!(row.route, "N/A → N/A");
        assert_eq!(row.departure, "N/A");
        assert!(row.image_url.is_none());
        assert!(row.can_confirm);
    }

    #[test]
    fn test_row_view_carries_flight_image() {
        let mut r = reservation(1, 1, ReservationStatus::Confirmed);
        r.flight = Some(volar_shared::Flight {
            id: 3,
            airline: Some("Volaris".into()),
            image_url: Some("https://cdn.example.com/y4-101.png".into()),
            ..Default::default()
        });
        let (item, _, _) = item_with(r);

        let row = item.view();
        assert_eq!(row.airline, "Volaris");
        assert_eq!(row.image_url.as_deref(), Some("https://cdn.example.com/y4-101.png"));
    }

    #[tokio::test]
    async fn test_configured_limit_bounds_the_draft() {
        let limit = PassengerLimit::new(3).unwrap();
        let (item, gateway, _) = item_limited(reservation(1, 5, ReservationStatus::Pending), limit);

        // Server value above the limit is pulled into range when editing starts
        let _ = item.open_edit();
        assert_eq!(item.edit_state(), EditState::Open { draft: limit.count(3).unwrap() });
        assert!(matches!(item.increment_draft(), Outcome::Rejected(_)));
        assert!(matches!(item.set_draft(4), Outcome::Rejected(_)));

        assert_eq!(item.decrement_draft(), Outcome::Applied);
        assert_eq!(item.submit_edit().await, Outcome::Applied);
        assert_eq!(gateway.calls(), vec![GatewayCall::Update { id: 1, passengers: 2 }]);
    }
}
