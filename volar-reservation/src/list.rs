use async_trait::async_trait;
use std::sync::{Arc, Mutex, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use volar_core::scope::run_scoped;
use volar_core::{
    Navigator, PassengerLimit, ReservationError, ReservationGateway, Route, SessionStore,
};
use volar_shared::Reservation;

use crate::item::ReservationItem;
use crate::{lock, Refresh};

pub const LOGIN_REQUIRED: &str = "You must log in or register to see your reservations.";
pub const LOAD_FAILED: &str = "Could not load your reservations.";

/// What the reservation list shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    /// No session. Terminal until the user navigates to login.
    Unauthenticated { message: String },
    /// A fetch is running; `stale` holds the rows still on screen.
    Loading { stale: Vec<Reservation> },
    Loaded(Vec<Reservation>),
    /// Fetched fine, nothing booked. Offers a flight search instead.
    Empty,
    /// Fetch failed; `retry` starts over.
    Error { message: String },
}

impl ListState {
    /// Rows currently displayed.
    pub fn reservations(&self) -> &[Reservation] {
        match self {
            ListState::Loading { stale } => stale,
            ListState::Loaded(rows) => rows,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading { .. })
    }
}

struct ListView {
    state: ListState,
    items: Vec<ReservationItem>,
    mounted: bool,
    limit: PassengerLimit,
}

struct ListInner {
    gateway: Arc<dyn ReservationGateway>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    scope: CancellationToken,
    view: Mutex<ListView>,
}

/// Controller behind the "my reservations" screen.
///
/// Every fetch is a full snapshot from the server; whichever fetch completes
/// last defines what is shown. Items are kept per reservation id across
/// fetches so that an open dialog survives a refresh.
#[derive(Clone)]
pub struct ReservationList {
    inner: Arc<ListInner>,
}

/// Refresh callback handed to items. Weak so rows don't keep a torn-down
/// list alive.
struct ListRefresher {
    list: Weak<ListInner>,
}

#[async_trait]
impl Refresh for ListRefresher {
    async fn refresh(&self) {
        if let Some(inner) = self.list.upgrade() {
            ReservationList { inner }.refresh().await;
        }
    }
}

impl ReservationList {
    pub fn new(
        gateway: Arc<dyn ReservationGateway>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(ListInner {
                gateway,
                session,
                navigator,
                scope: CancellationToken::new(),
                view: Mutex::new(ListView {
                    state: ListState::Loading { stale: Vec::new() },
                    items: Vec::new(),
                    mounted: false,
                    limit: PassengerLimit::default(),
                }),
            }),
        }
    }

    /// Bound applied by the edit dialog of every row created from here on.
    pub fn with_passenger_limit(self, limit: PassengerLimit) -> Self {
        lock(&self.inner.view).limit = limit;
        self
    }

    pub fn state(&self) -> ListState {
        lock(&self.inner.view).state.clone()
    }

    /// Row controllers in server order.
    pub fn items(&self) -> Vec<ReservationItem> {
        lock(&self.inner.view).items.clone()
    }

    pub fn item(&self, id: i64) -> Option<ReservationItem> {
        lock(&self.inner.view)
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// First load. Later calls are no-ops returning the current state.
    pub async fn mount(&self) -> ListState {
        {
            let mut view = lock(&self.inner.view);
            if view.mounted {
                return view.state.clone();
            }
            view.mounted = true;
        }
        self.fetch("mount").await
    }

    /// Pull-to-refresh; rows stay visible until the new result lands.
    pub async fn refresh(&self) -> ListState {
        self.fetch("refresh").await
    }

    pub async fn retry(&self) -> ListState {
        self.fetch("retry").await
    }

    /// Call to action of the unauthenticated state.
    pub fn go_to_login(&self) {
        self.inner.navigator.navigate(Route::Login);
    }

    /// Call to action of the empty state.
    pub fn search_flights(&self) {
        self.inner.navigator.navigate(Route::Flights);
    }

    /// Abandons in-flight requests of the list and all of its rows.
    pub fn teardown(&self) {
        info!("Reservation list torn down");
        self.inner.scope.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.scope.is_cancelled()
    }

    fn refresher(&self) -> Arc<dyn Refresh> {
        Arc::new(ListRefresher {
            list: Arc::downgrade(&self.inner),
        })
    }

    async fn fetch(&self, reason: &str) -> ListState {
        if self.is_torn_down() {
            return self.state();
        }

        {
            let mut view = lock(&self.inner.view);
            let stale = view.state.reservations().to_vec();
            view.state = ListState::Loading { stale };
        }

        if self.inner.session.token().is_none() {
            info!("No session token; reservations need a login");
            return self.settle(ListState::Unauthenticated {
                message: LOGIN_REQUIRED.to_string(),
            });
        }

        debug!("Fetching reservations ({})", reason);
        let result = run_scoped(&self.inner.scope, self.inner.gateway.list()).await;
        match result {
            Ok(rows) if rows.is_empty() => self.settle(ListState::Empty),
            Ok(rows) => {
                info!("Loaded {} reservations", rows.len());
                self.settle(ListState::Loaded(rows))
            }
            Err(ReservationError::Cancelled) => self.state(),
            Err(ReservationError::Unauthenticated) => self.settle(ListState::Unauthenticated {
                message: LOGIN_REQUIRED.to_string(),
            }),
            Err(err) => {
                warn!("Failed to load reservations: {}", err);
                self.settle(ListState::Error {
                    message: LOAD_FAILED.to_string(),
                })
            }
        }
    }

    /// Applies a fetch result: rows are matched to existing item controllers
    /// by id, new rows get a fresh item, vanished rows are torn down.
    fn settle(&self, next: ListState) -> ListState {
        let mut view = lock(&self.inner.view);
        if self.inner.scope.is_cancelled() {
            return view.state.clone();
        }

        let limit = view.limit;
        let mut previous = std::mem::take(&mut view.items);
        let mut items = Vec::with_capacity(next.reservations().len());
        for reservation in next.reservations() {
            match previous.iter().position(|item| item.id() == reservation.id) {
                Some(pos) => {
                    let item = previous.swap_remove(pos);
                    item.sync(reservation.clone());
                    items.push(item);
                }
                None => items.push(ReservationItem::new(
                    reservation.clone(),
                    self.inner.gateway.clone(),
                    self.refresher(),
                    self.inner.scope.child_token(),
                    limit,
                )),
            }
        }
        for gone in previous {
            debug!(reservation_id = gone.id(), "Row removed after re-fetch");
            gone.teardown();
        }

        view.items = items;
        view.state = next;
        view.state.clone()
    }
}

#[async_trait]
impl Refresh for ReservationList {
    async fn refresh(&self) {
        ReservationList::refresh(self).await;
    }
}
