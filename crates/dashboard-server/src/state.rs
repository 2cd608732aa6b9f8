//! Application State

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use portfolio_dashboard::DashboardDriver;

use crate::session::{DashboardSession, SessionId};

/// Default idle limit before a session is reaped
const DEFAULT_SESSION_IDLE_SECS: u64 = 900;

/// Upper bound on the time between sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Idle limit from `SESSION_IDLE_SECS`
pub fn session_idle_from_env() -> Duration {
    let secs = std::env::var("SESSION_IDLE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SESSION_IDLE_SECS);
    Duration::from_secs(secs)
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Executes refresh and advice commands for every session
    pub driver: Arc<DashboardDriver>,

    /// Live dashboard sessions
    pub sessions: Arc<RwLock<HashMap<SessionId, Arc<DashboardSession>>>>,
}

impl AppState {
    pub fn new(driver: DashboardDriver) -> Self {
        Self {
            driver: Arc::new(driver),
            sessions: Arc::default(),
        }
    }

    pub async fn session(&self, id: SessionId) -> Option<Arc<DashboardSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn insert(&self, session: Arc<DashboardSession>) {
        self.sessions.write().await.insert(session.id(), session);
    }

    pub async fn remove(&self, id: SessionId) -> Option<Arc<DashboardSession>> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Remove and shut down every session idle for longer than `max_idle`.
    /// Returns how many were reaped.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let expired = {
            let mut sessions = self.sessions.write().await;
            let mut expired = Vec::new();
            for (id, session) in sessions.iter() {
                if session.idle_for().await > max_idle {
                    expired.push(*id);
                }
            }
            expired
                .into_iter()
                .filter_map(|id| sessions.remove(&id))
                .collect::<Vec<_>>()
        };

        for session in &expired {
            tracing::info!(session = %session.id(), "reaping idle session");
            session.shutdown().await;
        }
        expired.len()
    }

    /// Sweep idle sessions in the background for the life of the process
    pub fn spawn_reaper(&self, max_idle: Duration) -> JoinHandle<()> {
        let state = self.clone();
        let every = max_idle.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reaped = state.reap_idle(max_idle).await;
                if reaped > 0 {
                    let remaining = state.session_count().await;
                    tracing::debug!(reaped, remaining, "idle sweep");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{driver, StubProvider};
    use portfolio_dashboard::{sample_snapshot, Input};

    fn state(provider: StubProvider) -> AppState {
        AppState {
            driver: driver(provider),
            sessions: Arc::default(),
        }
    }

    async fn open(state: &AppState) -> Arc<DashboardSession> {
        let session = DashboardSession::new(sample_snapshot());
        state.insert(Arc::clone(&session)).await;
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_reap_idle_keeps_active_sessions() {
        let state = state(StubProvider::ok("-"));
        let stale = open(&state).await;
        let active = open(&state).await;

        tokio::time::advance(Duration::from_secs(600)).await;
        active.view().await;
        tokio::time::advance(Duration::from_secs(360)).await;

        assert_eq!(state.reap_idle(Duration::from_secs(900)).await, 1);
        assert!(state.session(stale.id()).await.is_none());
        assert!(state.session(active.id()).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reap_aborts_in_flight_work() {
        let state = state(StubProvider::slow(Duration::from_secs(3600)));
        let session = open(&state).await;
        session.apply(Input::FetchAdvice, &state.driver).await;
        assert_eq!(session.in_flight().await, 1);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(state.reap_idle(Duration::from_secs(10)).await, 1);
        assert_eq!(state.session_count().await, 0);
        assert_eq!(session.in_flight().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_sweeps_abandoned_sessions() {
        let state = state(StubProvider::ok("-"));
        for _ in 0..5 {
            open(&state).await;
        }
        let reaper = state.spawn_reaper(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(state.session_count().await, 0);
        reaper.abort();
    }
}
