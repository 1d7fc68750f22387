//! Checkout Session State
//!
//! Typed replacement for per-tab browser storage: one [`CheckoutSession`]
//! holds everything the three stages hand to each other, and a
//! [`SessionStore`] is the only place it is read from or written to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CheckoutError, Result};
use crate::intent::OrderIntent;
use crate::order::OrderConfirmation;
use crate::payment_method::PaymentMethod;
use crate::provider::Credentials;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
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

/// Which payment method variant the capture stage produces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Basic,
    Agentic,
}

/// Where the session is in the setup → capture → order workflow
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum CheckoutStage {
    /// Credentials not yet issued
    #[default]
    Setup,

    /// Credentials loaded, waiting for a card or a selection
    Capture,

    /// An intent needs verification before the order stage opens
    AwaitingVerification {
        intent: OrderIntent,
        project_id: String,
        /// Bearer used for the verification call
        #[serde(skip)]
        bearer: String,
    },

    /// Payment method captured; the order stage may run
    Ready,
}

impl CheckoutStage {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutStage::Setup => "setup",
            CheckoutStage::Capture => "capture",
            CheckoutStage::AwaitingVerification { .. } => "awaiting-verification",
            CheckoutStage::Ready => "ready",
        }
    }
}

/// Order-stage status: `idle → submitting → {succeeded | failed}`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        confirmation: OrderConfirmation,
    },
    Failed {
        message: String,
    },
}

impl OrderStatus {
    pub fn is_submitting(&self) -> bool {
        matches!(self, OrderStatus::Submitting)
    }
}

/// A complete checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Unique identifier
    pub id: SessionId,

    /// Credentials from the bootstrap stage
    #[serde(skip)]
    pub credentials: Option<Credentials>,

    /// Workflow stage
    pub stage: CheckoutStage,

    /// Captured payment method
    pub payment_method: Option<PaymentMethod>,

    /// Order stage status
    pub order_status: OrderStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Create a new session
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            credentials: None,
            stage: CheckoutStage::Setup,
            payment_method: None,
            order_status: OrderStatus::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create with specific ID
    pub fn with_id(id: SessionId) -> Self {
        let mut session = Self::new();
        session.id = id;
        session
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| CheckoutError::InvalidState("credentials not loaded; run setup first".into()))
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
        if self.stage == CheckoutStage::Setup {
            self.stage = CheckoutStage::Capture;
        }
        self.touch();
    }

    pub fn set_stage(&mut self, stage: CheckoutStage) {
        self.stage = stage;
        self.touch();
    }

    /// Store the captured payment method and open the order stage
    pub fn store_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
        self.stage = CheckoutStage::Ready;
        self.order_status = OrderStatus::Idle;
        self.touch();
    }

    pub fn set_order_status(&mut self, status: OrderStatus) {
        self.order_status = status;
        self.touch();
    }
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Session store trait for persistence
pub trait SessionStore: Send + Sync {
    /// Save a session
    fn save(&self, session: &CheckoutSession) -> Result<()>;

    /// Load a session by ID
    fn load(&self, id: &SessionId) -> Result<Option<CheckoutSession>>;

    /// Delete a session
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// IDs of sessions with no activity since `cutoff`
    fn idle_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>>;

    /// Delete every session idle for longer than `max_idle`; returns how many
    ///
    /// Deleting a session discards its payment method.
    fn evict_idle(&self, max_idle: std::time::Duration) -> Result<usize> {
        let max_idle = chrono::Duration::from_std(max_idle)
            .map_err(|e| CheckoutError::Config(format!("session idle limit: {e}")))?;
        let stale = self.idle_since(Utc::now() - max_idle)?;
        for id in &stale {
            self.delete(id)?;
        }
        Ok(stale.len())
    }

    /// Load a session or fail with [`CheckoutError::SessionNotFound`]
    fn require(&self, id: &SessionId) -> Result<CheckoutSession> {
        self.load(id)?
            .ok_or_else(|| CheckoutError::SessionNotFound(id.to_string()))
    }
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: std::sync::RwLock<std::collections::HashMap<SessionId, CheckoutSession>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CheckoutError {
    CheckoutError::Session("session store lock poisoned".into())
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &CheckoutSession) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<CheckoutSession>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(id);
        Ok(())
    }

    fn idle_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionId>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions
            .values()
            .filter(|s| s.updated_at < cutoff)
            .map(|s| s.id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = CheckoutSession::new();
        assert_eq!(session.stage, CheckoutStage::Setup);
        assert!(session.payment_method.is_none());
        assert!(session.credentials().is_err());
    }

    #[test]
    fn test_credentials_open_capture_stage() {
        let mut session = CheckoutSession::new();
        session.set_credentials(Credentials {
            jwt: "jwt".into(),
            tokenization_api_key: "key".into(),
            project_id: None,
        });
        assert_eq!(session.stage, CheckoutStage::Capture);
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        let mut session = CheckoutSession::new();
        session.store_payment_method(PaymentMethod::basic("tok_1"));
        let id = session.id.clone();

        store.save(&session).unwrap();

        let loaded = store.require(&id).unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.payment_method, Some(PaymentMethod::basic("tok_1")));
        assert_eq!(loaded.stage, CheckoutStage::Ready);

        store.delete(&id).unwrap();
        assert!(matches!(
            store.require(&id),
            Err(CheckoutError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_evict_idle_sessions() {
        let store = MemorySessionStore::new();

        let mut stale = CheckoutSession::new();
        stale.store_payment_method(PaymentMethod::basic("tok_old"));
        stale.updated_at = Utc::now() - chrono::Duration::minutes(45);
        store.save(&stale).unwrap();

        let fresh = CheckoutSession::new();
        store.save(&fresh).unwrap();

        let evicted = store.evict_idle(std::time::Duration::from_secs(30 * 60)).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 1);
        assert!(store.load(&stale.id).unwrap().is_none());
        assert!(store.load(&fresh.id).unwrap().is_some());
    }
}
