use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "N/A";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Airport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Airport {
    /// Display label: airport name, falling back to the city.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.city.as_deref())
            .unwrap_or(UNKNOWN)
    }
}

/// A scheduled flight as published by the API. Read-only on this side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: i64,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default, deserialize_with = "super::de_opt_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub departure_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub arrival_datetime: Option<DateTime<Utc>>,
    #[serde(default, rename = "departureAirport", alias = "departure_airport")]
    pub departure_airport: Option<Airport>,
    #[serde(default, rename = "destinationAirport", alias = "destination_airport")]
    pub destination_airport: Option<Airport>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Flight {
    pub fn airline_name(&self) -> &str {
        self.airline.as_deref().unwrap_or(UNKNOWN)
    }

    /// `"Origin → Destination"`, with `N/A` for unknown endpoints.
    pub fn route(&self) -> String {
        let from = self.departure_airport.as_ref().map_or(UNKNOWN, Airport::label);
        let to = self.destination_airport.as_ref().map_or(UNKNOWN, Airport::label);
        format!("{} → {}", from, to)
    }
}
