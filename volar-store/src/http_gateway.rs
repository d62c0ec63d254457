use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use volar_core::{
    CoreResult, FlightCatalog, PassengerCount, ReservationError, ReservationGateway, SessionStore,
};
use volar_shared::{CreatedReservation, Flight, Reservation, ReservationStatus};

use crate::app_config::ApiConfig;

#[derive(Debug, Serialize)]
struct NewReservation {
    flight_id: i64,
    passenger_count: u32,
    status: ReservationStatus,
}

#[derive(Debug, Serialize)]
struct PassengerPatch {
    passenger_count: u32,
}

/// Error payloads seen from the API: `{"error": ".."}` or `{"message": ".."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// REST client for the reservation and flight endpoints.
///
/// Every reservation call reads the session token first and fails with
/// `Unauthenticated` before touching the network when there is none.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig, session: Arc<dyn SessionStore>) -> CoreResult<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| ReservationError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn reservations_url(&self) -> String {
        format!("{}/reservations", self.base_url)
    }

    fn reservation_url(&self, id: i64) -> String {
        format!("{}/reservations/{}", self.base_url, id)
    }

    /// Attaches the bearer token, or refuses to build the request at all.
    fn authorized(&self, request: RequestBuilder) -> CoreResult<RequestBuilder> {
        let token = self.session.token().ok_or(ReservationError::Unauthenticated)?;
        Ok(request.bearer_auth(token.expose()))
    }

    async fn send(&self, request: RequestBuilder) -> CoreResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = failure_message(status, response).await;
        warn!("Reservation API returned {}: {}", status, message);
        if status == StatusCode::UNAUTHORIZED {
            return Err(ReservationError::Unauthenticated);
        }
        Err(ReservationError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> CoreResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ReservationError::Decode(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> ReservationError {
    if err.is_decode() {
        ReservationError::Decode(err.to_string())
    } else {
        ReservationError::Network(err.to_string())
    }
}

async fn failure_message(status: StatusCode, response: Response) -> String {
    let fallback = status
        .canonical_reason()
        .unwrap_or("Unexpected response")
        .to_string();

    match response.text().await {
        Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error.or(parsed.message).unwrap_or(fallback),
            Err(_) if !body.trim().is_empty() && body.len() <= 200 => body.trim().to_string(),
            Err(_) => fallback,
        },
        Err(_) => fallback,
    }
}

#[async_trait]
impl ReservationGateway for HttpGateway {
    async fn list(&self) -> CoreResult<Vec<Reservation>> {
        let request = self.authorized(self.client.get(self.reservations_url()))?;
        let reservations: Vec<Reservation> = self.send_json(request).await?;
        debug!("Fetched {} reservations", reservations.len());
        Ok(reservations)
    }

    async fn create(&self, flight_id: i64, passengers: PassengerCount) -> CoreResult<Reservation> {
        let body = NewReservation {
            flight_id,
            passenger_count: passengers.get(),
            status: ReservationStatus::Pending,
        };
        let request = self.authorized(self.client.post(self.reservations_url()))?.json(&body);
        let created: CreatedReservation = self.send_json(request).await?;
        let created = created
            .into_reservation(flight_id, passengers.get())
            .ok_or_else(|| ReservationError::Decode("create response carried no reservation id".into()))?;
        info!("Reservation {} created for flight {}", created.id, flight_id);
        Ok(created)
    }

    async fn update(&self, id: i64, passengers: PassengerCount) -> CoreResult<Reservation> {
        let body = PassengerPatch {
            passenger_count: passengers.get(),
        };
        let request = self.authorized(self.client.patch(self.reservation_url(id)))?.json(&body);
        let updated = self.send_json(request).await?;
        info!("Reservation {} updated to {} passengers", id, passengers);
        Ok(updated)
    }

    async fn remove(&self, id: i64) -> CoreResult<()> {
        let request = self.authorized(self.client.delete(self.reservation_url(id)))?;
        self.send(request).await?;
        info!("Reservation {} deleted", id);
        Ok(())
    }

    async fn confirm(&self, id: i64) -> CoreResult<Reservation> {
        let url = format!("{}/confirm", self.reservation_url(id));
        let request = self.authorized(self.client.post(url))?;
        let confirmed = self.send_json(request).await?;
        info!("Reservation {} confirmed", id);
        Ok(confirmed)
    }
}

#[async_trait]
impl FlightCatalog for HttpGateway {
    async fn flight(&self, id: i64) -> CoreResult<Flight> {
        let request = self.client.get(format!("{}/flights/{}", self.base_url, id));
        self.send_json(request).await
    }
}
