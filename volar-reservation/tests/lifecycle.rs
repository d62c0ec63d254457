//! End-to-end reservation lifecycle against the in-memory reservation API.

use std::sync::Arc;
use volar_core::gateway::{GatewayCall, MockGateway, Operation};
use volar_core::navigation::RecordingNavigator;
use volar_core::{Credentials, MemorySessionStore, ReservationError, SessionStore};
use volar_reservation::booking::BookingController;
use volar_reservation::{ListState, Outcome, ReservationList};
use volar_shared::{Reservation, ReservationStatus};

fn pending_300() -> Reservation {
    reservation(1, 2, 300.0, ReservationStatus::Pending)
}

fn reservation(id: i64, passengers: u32, total: f64, status: ReservationStatus) -> Reservation {
    Reservation {
        id,
        flight_id: 11,
        passenger_count: passengers,
        total_price: total,
        reservation_date: None,
        status,
        flight: None,
    }
}

struct App {
    gateway: Arc<MockGateway>,
    session: Arc<MemorySessionStore>,
    navigator: Arc<RecordingNavigator>,
    list: ReservationList,
}

fn app(reservations: Vec<Reservation>) -> App {
    let session = Arc::new(MemorySessionStore::signed_in(Credentials::new("bearer")));
    let gateway = Arc::new(
        MockGateway::new()
            .with_session(session.clone())
            .with_reservations(reservations),
    );
    let navigator = Arc::new(RecordingNavigator::new());
    let list = ReservationList::new(gateway.clone(), session.clone(), navigator.clone());
    App { gateway, session, navigator, list }
}

#[tokio::test]
async fn test_pending_row_renders_with_confirm_action() {
    let app = app(vec![pending_300()]);
    let _ = app.list.mount().await;

    let items = app.list.items();
    assert_eq!(items.len(), 1);
    let row = items[0].view();
    assert_eq!(row.passengers, 2);
    assert!(row.total_price.starts_with("$300"));
    assert_eq!(row.status, "PENDING");
    assert!(row.can_confirm);
}

#[tokio::test]
async fn test_confirm_then_refresh_hides_action() {
    let app = app(vec![pending_300()]);
    let _ = app.list.mount().await;

    let item = app.list.item(1).unwrap();
    assert_eq!(item.confirm_payment().await, Outcome::Applied);

    let row = app.list.item(1).unwrap().view();
    assert_eq!(row.status, "CONFIRMED");
    assert!(!row.can_confirm);
    assert_eq!(
        app.gateway.calls(),
        vec![GatewayCall::List, GatewayCall::Confirm { id: 1 }, GatewayCall::List]
    );
}

#[tokio::test]
async fn test_failed_delete_keeps_row() {
    let app = app(vec![pending_300()]);
    let _ = app.list.mount().await;
    app.gateway.fail_next(
        Operation::Remove,
        ReservationError::Server { status: 503, message: String::new() },
    );

    let item = app.list.item(1).unwrap();
    let _ = item.request_delete();
    let outcome = item.confirm_delete().await;

    assert!(outcome.alert().is_some());
    assert_eq!(app.list.state(), ListState::Loaded(vec![pending_300()]));
    assert_eq!(app.list.item(1).unwrap().view().passengers, 2);
}

#[tokio::test]
async fn test_deleted_row_disappears_only_after_refetch() {
    let app = app(vec![pending_300(), reservation(2, 1, 150.0, ReservationStatus::Confirmed)]);
    let _ = app.list.mount().await;

    let item = app.list.item(1).unwrap();
    let _ = item.request_delete();
    app.gateway.stall(Operation::List);

    let deleting = tokio::spawn({
        let item = item.clone();
        async move { item.confirm_delete().await }
    });
    // Server accepted the delete; the re-fetch is still running
    while app.gateway.calls().len() < 3 {
        tokio::task::yield_now().await;
    }
    assert_eq!(app.list.state().reservations().len(), 2);
    assert!(app.list.item(1).is_some());

    app.gateway.release(Operation::List);
    // The stalled fetch never completes by itself; a fresh refresh lands
    let state = app.list.refresh().await;
    assert_eq!(state.reservations().len(), 1);
    assert!(app.list.item(1).is_none());

    app.list.teardown();
    let _ = deleting.await.unwrap();
}

#[tokio::test]
async fn test_edit_and_delete_race_converges_on_last_fetch() {
    let app = app(vec![pending_300()]);
    let _ = app.list.mount().await;
    let item = app.list.item(1).unwrap();

    let _ = item.open_edit();
    let _ = item.increment_draft();
    let _ = item.request_delete();

    let (edit, delete) = tokio::join!(item.submit_edit(), item.confirm_delete());
    // Whichever order the server saw, the final fetch is authoritative
    assert_eq!(delete, Outcome::Applied);
    assert!(matches!(edit, Outcome::Applied | Outcome::Failed(_) | Outcome::Cancelled));

    let settled = app.list.state();
    assert_eq!(settled, ListState::Empty);
    assert_eq!(app.list.refresh().await, settled);
}

#[tokio::test]
async fn test_no_token_reaches_unauthenticated_without_calls() {
    let app = app(vec![pending_300()]);
    app.session.sign_out().unwrap();

    let state = app.list.mount().await;
    assert!(matches!(state, ListState::Unauthenticated { .. }));
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_booking_then_list_shows_new_reservation() {
    let app = app(vec![]);
    assert_eq!(app.list.mount().await, ListState::Empty);

    let booking = BookingController::new(
        11,
        app.gateway.clone(),
        app.gateway.clone(),
        app.session.clone(),
        app.navigator.clone(),
    );
    let _ = booking.set_passengers(3);
    assert_eq!(booking.book().await, Outcome::Applied);
    let _ = booking.acknowledge();

    let state = app.list.refresh().await;
    let rows = state.reservations();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].passenger_count, 3);
    assert_eq!(rows[0].status, ReservationStatus::Pending);
    assert_eq!(app.navigator.visited().last(), Some(&volar_core::Route::Reservations));
}
