//! Dashboard Sessions
//!
//! One [`Dashboard`] per connected client. Commands produced by `dispatch`
//! run as tasks in the session's `JoinSet`; their completion events are fed
//! back under the same lock. Dropping or shutting down the session aborts
//! whatever is still in flight.
//!
//! Client calls (`view`, `apply`) mark the session active; sessions idle past
//! the configured limit are reaped by [`AppState::reap_idle`].
//!
//! [`AppState::reap_idle`]: crate::state::AppState::reap_idle

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use portfolio_dashboard::{Command, Dashboard, DashboardDriver, DashboardView, Input, PortfolioSnapshot};

/// Unique session identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a path segment; `None` if it is not a valid id
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dashboard plus the time a client last touched it
struct Live {
    dashboard: Dashboard,
    last_active: Instant,
}

pub struct DashboardSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    live: Mutex<Live>,
    tasks: Mutex<JoinSet<()>>,
}

impl DashboardSession {
    pub fn new(snapshot: PortfolioSnapshot) -> Arc<Self> {
        Arc::new(Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            live: Mutex::new(Live {
                dashboard: Dashboard::new(snapshot),
                last_active: Instant::now(),
            }),
            tasks: Mutex::new(JoinSet::new()),
        })
    }

    pub const fn id(&self) -> SessionId {
        self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn view(&self) -> DashboardView {
        let mut live = self.live.lock().await;
        live.last_active = Instant::now();
        DashboardView::render(&live.dashboard)
    }

    /// Time since a client last viewed or sent input
    pub async fn idle_for(&self) -> Duration {
        self.live.lock().await.last_active.elapsed()
    }

    /// Dispatch `input`, start any resulting command, and return the new view.
    pub async fn apply(self: &Arc<Self>, input: Input, driver: &Arc<DashboardDriver>) -> DashboardView {
        let (command, view) = {
            let mut live = self.live.lock().await;
            live.last_active = Instant::now();
            let command = live.dashboard.dispatch(input);
            (command, DashboardView::render(&live.dashboard))
        };

        if let Some(command) = command {
            self.spawn(command, Arc::clone(driver)).await;
        }
        view
    }

    async fn spawn(self: &Arc<Self>, command: Command, driver: Arc<DashboardDriver>) {
        // Tasks hold a weak handle so the session is not kept alive by its own work
        let session: Weak<Self> = Arc::downgrade(self);
        let ticket = command.ticket();

        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}

        tracing::debug!(session = %self.id, %ticket, "spawning command");
        tasks.spawn(async move {
            let event = driver.execute(command).await;
            match session.upgrade() {
                Some(session) => {
                    session.live.lock().await.dashboard.dispatch(event);
                }
                None => tracing::debug!(%ticket, "session gone, completion dropped"),
            }
        });
    }

    /// Number of commands still running
    pub async fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Abort all in-flight commands. No state changes after this returns.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        let aborted = tasks.len();
        tasks.shutdown().await;
        tracing::info!(session = %self.id, aborted, "session closed");
    }

    #[cfg(test)]
    pub async fn settle(&self) {
        let mut tasks = self.tasks.lock().await;
        while tasks.join_next().await.is_some() {}
    }
}
