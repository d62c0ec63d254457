use volar_core::{Alert, AlertKind, Navigator, Route};
use volar_reservation::ReservationRow;

/// Navigation requests become hints about which command to run next.
pub struct HintNavigator;

impl Navigator for HintNavigator {
    fn navigate(&self, route: Route) {
        let hint = match route {
            Route::Login => "Log in with `volar login <token>`.".to_string(),
            Route::Flights => "Browse flights in the app, then `volar book <flight-id>`.".to_string(),
            Route::FlightDetail { flight_id } => format!("See flight {} with `volar book {}`.", flight_id, flight_id),
            Route::Reservations => "See your reservations with `volar list`.".to_string(),
            Route::Back => return,
        };
        println!("→ {}", hint);
    }
}

pub fn print_alert(alert: &Alert) {
    let marker = match alert.kind {
        AlertKind::Info => "!",
        AlertKind::Error => "✗",
    };
    eprintln!("{} {}: {}", marker, alert.title, alert.message);
    if let Some(detail) = &alert.detail {
        eprintln!("  ({})", detail);
    }
}

pub fn print_row(row: &ReservationRow) {
    println!("#{:<5} {:<10} {}", row.id, row.status, row.airline);
    println!("       {}", row.route);
    println!("       departs {}  arrives {}", row.departure, row.arrival);
    println!("       {} passenger(s)  total {}", row.passengers, row.total_price);
    if row.can_confirm {
        println!("       confirm payment: `volar confirm {}`", row.id);
    }
}
