use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use volar_core::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Flights,
    Stats,
    Chatbot,
    Reservations,
    AiChat,
}

impl Tab {
    pub fn title(self) -> &'static str {
        match self {
            Tab::Flights => "Home",
            Tab::Stats => "Statistics",
            Tab::Chatbot => "Chatbot",
            Tab::Reservations => "Reservations",
            Tab::AiChat => "AI Chat",
        }
    }
}

/// Tabs shown for a given session state. Reservations need a login.
pub fn visible_tabs(authenticated: bool) -> Vec<Tab> {
    let mut tabs = vec![Tab::Flights, Tab::Stats, Tab::Chatbot];
    if authenticated {
        tabs.push(Tab::Reservations);
    }
    tabs.push(Tab::AiChat);
    tabs
}

/// Keeps the tab bar in step with the session by listening to session
/// change notifications.
pub struct TabGate {
    visible: watch::Receiver<Vec<Tab>>,
    scope: CancellationToken,
    task: JoinHandle<()>,
}

impl TabGate {
    pub fn spawn(session: &dyn SessionStore, scope: CancellationToken) -> Self {
        let mut changes = session.subscribe();
        let authenticated = changes.borrow_and_update().is_some();
        let (tx, visible) = watch::channel(visible_tabs(authenticated));

        let token = scope.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            // Session store dropped
                            break;
                        }
                        let authenticated = changes.borrow_and_update().is_some();
                        info!(authenticated, "Session changed; updating tabs");
                        tx.send_replace(visible_tabs(authenticated));
                    }
                }
            }
        });

        Self { visible, scope, task }
    }

    pub fn visible(&self) -> Vec<Tab> {
        self.visible.borrow().clone()
    }

    /// Receiver for front-ends that redraw on change.
    pub fn watch(&self) -> watch::Receiver<Vec<Tab>> {
        self.visible.clone()
    }

    pub async fn shutdown(self) {
        self.scope.cancel();
        let _ = self.task.await;
    }
}
