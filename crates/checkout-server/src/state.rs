//! Application State

use std::{sync::Arc, time::Duration};

use checkout_core::{CheckoutFlow, MemorySessionStore, SessionStore};

/// Upper bound on the time between two idle-session sweeps
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout workflow bound to the configured providers
    pub flow: Arc<CheckoutFlow>,

    /// Checkout sessions, one per browser tab
    pub sessions: Arc<MemorySessionStore>,

    /// Tokenization environment reported to the frontend
    pub environment: &'static str,
}

impl AppState {
    /// Periodically drop sessions with no activity for `max_idle`
    pub fn spawn_session_sweeper(&self, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let sessions = self.sessions.clone();
        let period = SWEEP_INTERVAL.min(max_idle).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match sessions.evict_idle(max_idle) {
                    Ok(0) => {}
                    Ok(evicted) => tracing::info!(
                        evicted,
                        remaining = sessions.len(),
                        "Evicted idle checkout sessions"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use checkout_core::{CheckoutSession, FlowConfig};
    use checkout_payments::{MockCommerce, MockTokenizer};

    use super::*;

    #[tokio::test]
    async fn test_sweeper_evicts_idle_sessions() {
        let state = AppState {
            flow: Arc::new(CheckoutFlow::new(
                Arc::new(MockCommerce::new()),
                Arc::new(MockTokenizer::new()),
                FlowConfig::default(),
            )),
            sessions: Arc::new(MemorySessionStore::new()),
            environment: "sandbox",
        };
        state.sessions.save(&CheckoutSession::new()).unwrap();
        state.sessions.save(&CheckoutSession::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sweeper = state.spawn_session_sweeper(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert_eq!(state.sessions.len(), 0);
    }
}
