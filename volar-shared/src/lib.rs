pub mod models;
pub mod secret;

pub use models::flight::{Airport, Flight};
pub use models::reservation::{CreatedReservation, Reservation, ReservationStatus};
pub use secret::Masked;
