use anyhow::{bail, Result};
use std::sync::Arc;
use volar_core::{FlightCatalog, Navigator, PassengerLimit, ReservationGateway, SessionStore};
use volar_reservation::booking::BookingStage;
use volar_reservation::{BookingController, ListState, Outcome, ReservationItem, ReservationList};

use crate::terminal::{print_alert, print_row};

pub struct Context<G> {
    pub gateway: Arc<G>,
    pub session: Arc<dyn SessionStore>,
    pub navigator: Arc<dyn Navigator>,
    pub limit: PassengerLimit,
}

impl<G> Context<G>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    fn list(&self) -> ReservationList {
        ReservationList::new(self.gateway.clone(), self.session.clone(), self.navigator.clone())
            .with_passenger_limit(self.limit)
    }
}

/// Prints the list state; returns whether rows are available.
fn report(list: &ReservationList, state: &ListState) -> bool {
    match state {
        ListState::Unauthenticated { message } => {
            eprintln!("{}", message);
            list.go_to_login();
            false
        }
        ListState::Empty => {
            println!("You have no reservations yet.");
            list.search_flights();
            false
        }
        ListState::Error { message } => {
            eprintln!("{} Run `volar list` to retry.", message);
            false
        }
        ListState::Loading { .. } => false,
        ListState::Loaded(_) => true,
    }
}

/// Loads the list and finds one row for an item-level command.
async fn find_item<G>(ctx: &Context<G>, id: i64) -> Result<(ReservationList, ReservationItem)>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    let list = ctx.list();
    let state = list.mount().await;
    if !report(&list, &state) {
        bail!("reservations unavailable");
    }
    match list.item(id) {
        Some(item) => Ok((list, item)),
        None => bail!("no reservation with id {}", id),
    }
}

/// Prints any alert, then the refreshed row. Failures become the exit status.
fn finish(list: &ReservationList, id: i64, outcome: Outcome) -> Result<()> {
    if let Some(alert) = outcome.alert() {
        print_alert(alert);
    }
    match outcome {
        Outcome::Applied => {
            match list.item(id) {
                Some(item) => print_row(&item.view()),
                None => println!("Reservation #{} is gone.", id),
            }
            Ok(())
        }
        Outcome::Ignored => bail!("action not available for reservation {}", id),
        Outcome::Rejected(_) | Outcome::Failed(_) | Outcome::Cancelled => bail!("reservation {} unchanged", id),
    }
}

pub async fn list<G>(ctx: &Context<G>) -> Result<()>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    let list = ctx.list();
    let state = list.mount().await;
    if report(&list, &state) {
        for item in list.items() {
            print_row(&item.view());
        }
    }
    Ok(())
}

pub async fn book<G>(ctx: &Context<G>, flight_id: i64, passengers: u32) -> Result<()>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    let booking = BookingController::new(
        flight_id,
        ctx.gateway.clone(),
        ctx.gateway.clone(),
        ctx.session.clone(),
        ctx.navigator.clone(),
    )
    .with_passenger_limit(ctx.limit);

    if let Outcome::Rejected(alert) = booking.set_passengers(passengers) {
        print_alert(&alert);
        bail!("booking not submitted");
    }
    if let Outcome::Failed(alert) = booking.load().await {
        print_alert(&alert);
        let _ = booking.acknowledge();
        bail!("flight {} unavailable", flight_id);
    }

    let outcome = booking.book().await;
    match booking.stage() {
        BookingStage::Booked(summary) => {
            println!("Reservation placed.\n{}", summary.message());
            let _ = booking.acknowledge();
            Ok(())
        }
        BookingStage::LoginPrompt => {
            if let Some(alert) = outcome.alert() {
                print_alert(alert);
            }
            let _ = booking.choose_login();
            bail!("login required")
        }
        BookingStage::Failed { alert, .. } => {
            print_alert(&alert);
            let _ = booking.acknowledge();
            bail!("booking failed")
        }
        other => bail!("booking ended in unexpected stage {:?}", other),
    }
}

pub async fn edit<G>(ctx: &Context<G>, id: i64, passengers: u32) -> Result<()>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    let (list, item) = find_item(ctx, id).await?;
    let _ = item.open_edit();
    if let Outcome::Rejected(alert) = item.set_draft(passengers) {
        print_alert(&alert);
        let _ = item.cancel_edit();
        bail!("reservation {} unchanged", id);
    }
    let outcome = item.submit_edit().await;
    finish(&list, id, outcome)
}

pub async fn delete<G>(ctx: &Context<G>, id: i64, confirmed: bool) -> Result<()>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    let (list, item) = find_item(ctx, id).await?;
    let Some(prompt) = item.request_delete() else {
        bail!("reservation {} is already being deleted", id);
    };
    if !confirmed {
        println!("{} {}", prompt.title, prompt.message);
        println!("Nothing deleted. Re-run with --yes to delete.");
        let _ = item.dismiss_delete();
        return Ok(());
    }
    let outcome = item.confirm_delete().await;
    finish(&list, id, outcome)
}

pub async fn confirm<G>(ctx: &Context<G>, id: i64) -> Result<()>
where
    G: ReservationGateway + FlightCatalog + 'static,
{
    let (list, item) = find_item(ctx, id).await?;
    if !item.can_confirm() {
        println!("Reservation #{} is already {}.", id, item.reservation().status);
        return Ok(());
    }
    let outcome = item.confirm_payment().await;
    finish(&list, id, outcome)
}
