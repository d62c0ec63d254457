use crate::ReservationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Informational notice, e.g. a rejected passenger count.
    Info,
    /// Blocking failure that needs an acknowledgement.
    Error,
}

/// A user-facing message raised by a controller. Presentation is up to the
/// front-end; controllers only decide the wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    /// Server-provided failure text, when the response carried one.
    pub detail: Option<String>,
}

impl Alert {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Info,
            title: title.into(),
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            title: "Error".to_string(),
            message: message.into(),
            detail: None,
        }
    }

    /// Generic failure alert for a gateway error, keeping any server text as detail.
    pub fn from_failure(message: impl Into<String>, err: &ReservationError) -> Self {
        let mut alert = Self::error(message);
        alert.detail = err.server_message().map(str::to_owned);
        alert
    }
}
