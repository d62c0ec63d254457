use std::sync::Mutex;

/// Navigation targets the reservation flows hand off to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Flights,
    FlightDetail { flight_id: i64 },
    Reservations,
    Back,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Keeps every requested route in order. Used by tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<Route> {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.visited().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!("Navigating to {:?}", route);
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(route);
    }
}
