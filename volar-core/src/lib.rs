pub mod alert;
pub mod gateway;
pub mod navigation;
pub mod passengers;
pub mod scope;
pub mod session;

pub use alert::{Alert, AlertKind};
pub use gateway::{FlightCatalog, ReservationGateway};
pub use navigation::{Navigator, Route};
pub use passengers::{PassengerCount, PassengerLimit};
pub use session::{AuthToken, Credentials, MemorySessionStore, SessionStore};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReservationError {
    #[error("Authentication required: must log in or register")]
    Unauthenticated,
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Server responded with {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Unreadable server response: {0}")]
    Decode(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Session storage failed: {0}")]
    Session(String),
    #[error("Request abandoned after its view was torn down")]
    Cancelled,
}

impl ReservationError {
    /// Message the server attached to a failed response, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ReservationError::Server { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// Transport and server failures can be retried by the user; the rest cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReservationError::Network(_)
                | ReservationError::Server { .. }
                | ReservationError::Decode(_)
        )
    }
}

pub type CoreResult<T> = Result<T, ReservationError>;
