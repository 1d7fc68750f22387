//! HTTP Handlers
//!
//! Every stateful handler follows the same pattern: load the session named
//! by the `x-checkout-session` header, run one workflow step, save the
//! session back (also when the step failed), then answer. Sessions are only
//! created by a successful setup stage.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    Json,
};
use serde::{Deserialize, Serialize};

use checkout_core::{
    AuthToken, CaptureMode, CaptureOutcome, CardForm, CheckoutError, CheckoutSession, Mandate,
    OrderForm, OrderStatus, PaymentMethod, RegisteredPaymentMethod, SessionId, SessionStore,
};

use crate::state::AppState;

/// Header carrying the checkout session id
pub const SESSION_HEADER: &str = "x-checkout-session";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub commerce_provider: String,
    pub tokenization_provider: String,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Whether repeating the same step may succeed
    pub retryable: bool,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub stage: &'static str,
    pub tokenization_api_key: String,
    pub project_id: Option<String>,
    pub environment: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    #[serde(default)]
    pub mode: CaptureMode,
    pub card: CardForm,
}

#[derive(Debug, Deserialize)]
pub struct AddPaymentMethodRequest {
    pub card: CardForm,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodsResponse {
    pub data: Vec<RegisteredPaymentMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPaymentMethodRequest {
    pub payment_method_id: String,
    #[serde(default)]
    pub mode: CaptureMode,
    #[serde(default)]
    pub mandate: Option<Mandate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderPageResponse {
    pub payment_method: Option<PaymentMethod>,
    pub can_submit: bool,
    pub error: Option<String>,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct SubmitOrderResponse {
    pub order_id: String,
    pub payment: serde_json::Value,
    pub message: String,
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Map a workflow error onto a status code and error body
pub fn api_error(err: CheckoutError) -> ApiError {
    let (status, code) = match &err {
        CheckoutError::Bootstrap(_) => (StatusCode::SERVICE_UNAVAILABLE, "BOOTSTRAP_FAILED"),
        CheckoutError::ElementsNotReady(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ELEMENTS_NOT_READY"),
        CheckoutError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT"),
        CheckoutError::Provider { .. } => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        CheckoutError::Network(_) => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR"),
        CheckoutError::UnexpectedResponse(_) => (StatusCode::BAD_GATEWAY, "UNEXPECTED_RESPONSE"),
        CheckoutError::MissingOrderId => (StatusCode::BAD_GATEWAY, "MISSING_ORDER_ID"),
        CheckoutError::VerificationFailed(_) => (StatusCode::PAYMENT_REQUIRED, "VERIFICATION_FAILED"),
        CheckoutError::MissingPaymentMethod => (StatusCode::CONFLICT, "MISSING_PAYMENT_METHOD"),
        CheckoutError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
        CheckoutError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        CheckoutError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(code, error = %err, "Request failed");
    } else {
        tracing::debug!(code, error = %err, "Request rejected");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
            retryable: err.is_retryable(),
        }),
    )
}

fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(SessionId::from_string)
}

fn auth_token(headers: &HeaderMap) -> Option<AuthToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(AuthToken::new)
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<CheckoutSession, ApiError> {
    let id = session_id(headers).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Missing {SESSION_HEADER} header"),
                code: "MISSING_SESSION".into(),
                retryable: false,
            }),
        )
    })?;
    state.sessions.require(&id).map_err(api_error)
}

/// Session for the order page, which also works from a bare link
///
/// Without a known session id the page runs on a throwaway session that is
/// never stored; the boolean says whether the session came from the store.
fn order_session(state: &AppState, headers: &HeaderMap) -> Result<(CheckoutSession, bool), ApiError> {
    let stored = match session_id(headers) {
        Some(id) => state.sessions.load(&id).map_err(api_error)?,
        None => None,
    };
    Ok(match stored {
        Some(session) => (session, true),
        None => (CheckoutSession::new(), false),
    })
}

/// Persist the session, then turn the step result into a response
fn persist<T>(
    state: &AppState,
    session: &CheckoutSession,
    result: checkout_core::Result<T>,
) -> Result<Json<T>, ApiError> {
    state.sessions.save(session).map_err(api_error)?;
    result.map(Json).map_err(api_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (commerce, tokenization) = state.flow.provider_names();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        commerce_provider: commerce.to_string(),
        tokenization_provider: tokenization.to_string(),
        active_sessions: state.sessions.len(),
    })
}

/// Stage 1: create (or resume) a session and fetch fresh credentials
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let existing = match session_id(&headers) {
        Some(id) => state.sessions.load(&id).map_err(api_error)?,
        None => None,
    };
    let mut session = existing.unwrap_or_default();

    // A failed bootstrap leaves nothing behind; the client simply retries
    state.flow.bootstrap(&mut session).await.map_err(api_error)?;
    state.sessions.save(&session).map_err(api_error)?;

    let credentials = session.credentials().map_err(api_error)?;
    tracing::info!(session_id = %session.id, stage = session.stage.name(), "Checkout session ready");

    Ok(Json(SessionResponse {
        session_id: session.id.to_string(),
        stage: session.stage.name(),
        tokenization_api_key: credentials.tokenization_api_key.clone(),
        project_id: credentials.project_id.clone(),
        environment: state.environment,
    }))
}

/// Stage 2: tokenize the submitted card
pub async fn capture_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CaptureRequest>,
) -> Result<Json<CaptureOutcome>, ApiError> {
    let mut session = require_session(&state, &headers)?;
    let result = state
        .flow
        .capture_card(&mut session, &payload.card, payload.mode)
        .await;
    persist(&state, &session, result)
}

/// Stage 2: confirm the pending intent after the verification widget closed
pub async fn confirm_verification(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CaptureOutcome>, ApiError> {
    let mut session = require_session(&state, &headers)?;
    let result = state.flow.confirm_verification(&mut session).await;
    persist(&state, &session, result)
}

pub async fn list_payment_methods(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PaymentMethodsResponse>, ApiError> {
    let session = require_session(&state, &headers)?;
    let data = state
        .flow
        .list_payment_methods(&session, auth_token(&headers).as_ref())
        .await
        .map_err(api_error)?;
    Ok(Json(PaymentMethodsResponse { data }))
}

pub async fn add_payment_method(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddPaymentMethodRequest>,
) -> Result<Json<RegisteredPaymentMethod>, ApiError> {
    let session = require_session(&state, &headers)?;
    state
        .flow
        .add_payment_method(&session, auth_token(&headers).as_ref(), &payload.card)
        .await
        .map(Json)
        .map_err(api_error)
}

pub async fn select_payment_method(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SelectPaymentMethodRequest>,
) -> Result<Json<CaptureOutcome>, ApiError> {
    let mut session = require_session(&state, &headers)?;
    let result = state
        .flow
        .select_saved_payment_method(
            &mut session,
            auth_token(&headers).as_ref(),
            &payload.payment_method_id,
            payload.mode,
            payload.mandate,
        )
        .await;
    persist(&state, &session, result)
}

/// Stage 3: what the order page should render
pub async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrderQuery>,
) -> Result<Json<OrderPageResponse>, ApiError> {
    let (session, _) = order_session(&state, &headers)?;
    let payment_method = state
        .flow
        .resolve_payment_method(&session, query.payment_method.as_deref());

    let error = payment_method
        .is_none()
        .then(|| CheckoutError::MissingPaymentMethod.user_message());

    Ok(Json(OrderPageResponse {
        can_submit: payment_method.is_some() && !session.order_status.is_submitting(),
        payment_method,
        error,
        status: session.order_status,
    }))
}

/// Stage 3: create the order and pay for it
pub async fn submit_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrderQuery>,
    Json(form): Json<OrderForm>,
) -> Result<Json<SubmitOrderResponse>, ApiError> {
    let (mut session, stored) = order_session(&state, &headers)?;
    let method = state
        .flow
        .begin_order(&mut session, query.payment_method.as_deref())
        .map_err(api_error)?;

    // Other requests see `submitting` while the provider calls run
    if stored {
        state.sessions.save(&session).map_err(api_error)?;
    }

    let result = state
        .flow
        .complete_order(&mut session, &method, &form)
        .await
        .map(|confirmation| SubmitOrderResponse {
            message: confirmation.message(),
            order_id: confirmation.order_id,
            payment: confirmation.payment,
        });

    if stored {
        persist(&state, &session, result)
    } else {
        result.map(Json).map_err(api_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::Request,
        Router,
    };
    use async_trait::async_trait;
    use checkout_core::{
        CheckoutFlow, CommerceProvider, CreateOrderRequest, Credentials, FlowConfig,
        MemorySessionStore, Order, OrderIntent, PaymentReceipt, PaymentToken,
        provider::{OrderIntentRequest, PurchaseIntentRequest},
    };
    use checkout_payments::{MockCommerce, MockTokenizer};
    use serde_json::{Value, json};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::*;

    struct Harness {
        app: Router,
        sessions: Arc<MemorySessionStore>,
        tokenizer: Arc<MockTokenizer>,
        commerce: Arc<MockCommerce>,
    }

    fn harness() -> Harness {
        harness_with(|commerce| commerce)
    }

    /// Harness whose flow talks to `wrap(mock)` instead of the mock itself
    fn harness_with(wrap: impl FnOnce(Arc<MockCommerce>) -> Arc<dyn CommerceProvider>) -> Harness {
        let commerce = Arc::new(MockCommerce::new());
        let tokenizer = Arc::new(MockTokenizer::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let flow = CheckoutFlow::new(wrap(commerce.clone()), tokenizer.clone(), FlowConfig::default());
        let state = AppState {
            flow: Arc::new(flow),
            sessions: sessions.clone(),
            environment: "sandbox",
        };
        Harness {
            app: crate::router(state),
            sessions,
            tokenizer,
            commerce,
        }
    }

    /// Pauses order creation until the test releases it
    #[derive(Default)]
    struct OrderGate {
        entered: Notify,
        release: Notify,
    }

    /// Mock commerce with a broken setup or a gated order creation
    struct ScriptedCommerce {
        inner: Arc<MockCommerce>,
        fail_setup: bool,
        gate: Option<Arc<OrderGate>>,
    }

    #[async_trait]
    impl CommerceProvider for ScriptedCommerce {
        async fn setup(&self) -> checkout_core::Result<Credentials> {
            if self.fail_setup {
                return Err(CheckoutError::provider("Setup", 503, "unavailable"));
            }
            self.inner.setup().await
        }

        async fn create_purchase_intent(
            &self,
            request: &PurchaseIntentRequest,
        ) -> checkout_core::Result<OrderIntent> {
            self.inner.create_purchase_intent(request).await
        }

        async fn create_order_intent(
            &self,
            auth: &AuthToken,
            request: &OrderIntentRequest,
        ) -> checkout_core::Result<OrderIntent> {
            self.inner.create_order_intent(auth, request).await
        }

        async fn create_order(&self, request: &CreateOrderRequest) -> checkout_core::Result<Order> {
            if let Some(gate) = &self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            self.inner.create_order(request).await
        }

        async fn submit_payment(
            &self,
            order_id: &str,
            token: &PaymentToken,
        ) -> checkout_core::Result<PaymentReceipt> {
            self.inner.submit_payment(order_id, token).await
        }

        fn name(&self) -> &str {
            "scripted-commerce"
        }
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        session: Option<&str>,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(id) = session {
            request = request.header(SESSION_HEADER, id);
        }
        if let Some(token) = auth {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = call(app, "POST", "/api/session", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    fn card() -> Value {
        json!({
            "number": {"ready": true, "value": "4242424242424242"},
            "expiration": {"ready": true, "month": 12, "year": 2030},
            "cvc": {"ready": true, "value": "123"},
            "cardholderName": "Jane Doe"
        })
    }

    fn order_form() -> Value {
        json!({"productUrl": "https://example.com/item", "email": "jane@example.com"})
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let (status, body) = call(&h.app, "GET", "/health", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["commerce_provider"], "mock-commerce");
    }

    #[tokio::test]
    async fn test_session_exposes_widget_credentials() {
        let h = harness();
        let (status, body) = call(&h.app, "POST", "/api/session", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "capture");
        assert_eq!(body["environment"], "sandbox");
        assert!(body["tokenization_api_key"].as_str().unwrap().starts_with("key_"));
    }

    #[tokio::test]
    async fn test_basic_checkout_end_to_end() {
        let h = harness();
        let id = open_session(&h.app).await;

        let (status, outcome) = call(
            &h.app,
            "POST",
            "/api/checkout/card",
            Some(&id),
            None,
            Some(json!({"mode": "basic", "card": card()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "completed");
        assert_eq!(outcome["payment_method"]["type"], "basic");
        assert!(outcome["redirect"].as_str().unwrap().starts_with("/order?paymentMethod="));

        let (_, page) = call(&h.app, "GET", "/api/order", Some(&id), None, None).await;
        assert_eq!(page["can_submit"], true);
        assert_eq!(page["status"]["status"], "idle");

        let (status, order) =
            call(&h.app, "POST", "/api/order", Some(&id), None, Some(order_form())).await;
        assert_eq!(status, StatusCode::OK);
        let order_id = order["order_id"].as_str().unwrap();
        assert_eq!(order["message"], format!("Order {order_id} submitted"));
        assert_eq!(h.commerce.order_count().await, 1);

        let (_, page) = call(&h.app, "GET", "/api/order", Some(&id), None, None).await;
        assert_eq!(page["status"]["status"], "succeeded");
    }

    #[tokio::test]
    async fn test_incomplete_card_is_rejected() {
        let h = harness();
        let id = open_session(&h.app).await;
        let mut incomplete = card();
        incomplete["cvc"]["ready"] = json!(false);

        let (status, body) = call(
            &h.app,
            "POST",
            "/api/checkout/card",
            Some(&id),
            None,
            Some(json!({"card": incomplete})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "ELEMENTS_NOT_READY");
    }

    #[tokio::test]
    async fn test_agentic_verification_can_be_retried() {
        let h = harness();
        let id = open_session(&h.app).await;

        let (_, outcome) = call(
            &h.app,
            "POST",
            "/api/checkout/card",
            Some(&id),
            None,
            Some(json!({"mode": "agentic", "card": card()})),
        )
        .await;
        assert_eq!(outcome["outcome"], "verification-required");
        let intent_id = outcome["intent_id"].as_str().unwrap().to_string();
        h.tokenizer.decline_intent(intent_id.clone()).await;

        let (status, body) = call(&h.app, "POST", "/api/checkout/verify", Some(&id), None, None).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["code"], "VERIFICATION_FAILED");

        let (_, page) = call(&h.app, "GET", "/api/order", Some(&id), None, None).await;
        assert_eq!(page["can_submit"], false);

        let (status, outcome) = call(&h.app, "POST", "/api/checkout/verify", Some(&id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["payment_method"]["type"], "agentic");
        assert_eq!(outcome["payment_method"]["purchaseIntentId"], intent_id);
    }

    #[tokio::test]
    async fn test_order_page_without_payment_method() {
        let h = harness();
        let (status, page) = call(&h.app, "GET", "/api/order", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["can_submit"], false);
        assert!(page["error"].as_str().unwrap().contains("register a card"));

        let (status, body) = call(&h.app, "POST", "/api/order", None, None, Some(order_form())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "MISSING_PAYMENT_METHOD");
        assert_eq!(h.commerce.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_order_page_reads_query_parameter() {
        let h = harness();
        let uri = format!("/api{}", PaymentMethod::basic("tok_1").order_url().unwrap());
        let (_, page) = call(&h.app, "GET", &uri, None, None, None).await;
        assert_eq!(page["payment_method"]["tokenId"], "tok_1");
        assert_eq!(page["can_submit"], true);
    }

    #[tokio::test]
    async fn test_payment_methods_require_sign_in() {
        let h = harness();
        let id = open_session(&h.app).await;

        let (status, body) = call(&h.app, "GET", "/api/payment-methods", Some(&id), None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let (status, added) = call(
            &h.app,
            "POST",
            "/api/payment-methods",
            Some(&id),
            Some("user-jwt"),
            Some(json!({"card": card()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let method_id = added["id"].as_str().unwrap().to_string();

        let (_, listed) =
            call(&h.app, "GET", "/api/payment-methods", Some(&id), Some("user-jwt"), None).await;
        assert!(listed["data"].as_array().unwrap().iter().any(|m| m["id"] == method_id.as_str()));

        let (status, outcome) = call(
            &h.app,
            "POST",
            "/api/payment-methods/select",
            Some(&id),
            Some("user-jwt"),
            Some(json!({"paymentMethodId": method_id, "mode": "agentic"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "verification-required");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let h = harness();
        let (status, body) = call(
            &h.app,
            "POST",
            "/api/checkout/verify",
            Some("no-such-session"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");

        let (status, body) = call(&h.app, "POST", "/api/checkout/verify", None, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_SESSION");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_failed_setup_stores_no_session() {
        let h = harness_with(|inner| {
            Arc::new(ScriptedCommerce {
                inner,
                fail_setup: true,
                gate: None,
            })
        });

        for _ in 0..3 {
            let (status, body) = call(&h.app, "POST", "/api/session", None, None, None).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body["code"], "BOOTSTRAP_FAILED");
            assert_eq!(body["retryable"], true);
        }
        assert_eq!(h.sessions.len(), 0);
    }

    #[tokio::test]
    async fn test_order_page_with_unknown_session_stores_nothing() {
        let h = harness();
        let uri = format!("/api{}", PaymentMethod::basic("tok_1").order_url().unwrap());

        for n in 0..5 {
            let id = format!("made-up-{n}");
            let (status, page) = call(&h.app, "GET", &uri, Some(&id), None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(page["can_submit"], true);

            let (status, _) = call(&h.app, "POST", &uri, Some(&id), None, Some(order_form())).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = call(&h.app, "POST", &uri, None, None, Some(order_form())).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(h.commerce.order_count().await, 6);
        assert_eq!(h.sessions.len(), 0);
    }

    #[tokio::test]
    async fn test_submitting_status_is_visible_while_order_runs() {
        let gate = Arc::new(OrderGate::default());
        let order_gate = gate.clone();
        let h = harness_with(move |inner| {
            Arc::new(ScriptedCommerce {
                inner,
                fail_setup: false,
                gate: Some(order_gate),
            })
        });
        let id = open_session(&h.app).await;
        let (status, _) = call(
            &h.app,
            "POST",
            "/api/checkout/card",
            Some(&id),
            None,
            Some(json!({"mode": "basic", "card": card()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, page) = call(&h.app, "GET", "/api/order", Some(&id), None, None).await;
        assert_eq!(page["status"]["status"], "idle");

        let app = h.app.clone();
        let order_session = id.clone();
        let submit = tokio::spawn(async move {
            call(&app, "POST", "/api/order", Some(&order_session), None, Some(order_form())).await
        });

        gate.entered.notified().await;
        let (_, page) = call(&h.app, "GET", "/api/order", Some(&id), None, None).await;
        assert_eq!(page["status"]["status"], "submitting");
        assert_eq!(page["can_submit"], false);

        gate.release.notify_one();
        let (status, _) = submit.await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let (_, page) = call(&h.app, "GET", "/api/order", Some(&id), None, None).await;
        assert_eq!(page["status"]["status"], "succeeded");
        assert_eq!(page["can_submit"], true);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            api_error(CheckoutError::Bootstrap("down".into())).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            api_error(CheckoutError::provider("Create order", 400, "bad")).0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(api_error(CheckoutError::MissingOrderId).0, StatusCode::BAD_GATEWAY);
        assert!(api_error(CheckoutError::Network("reset".into())).1.retryable);
        assert!(!api_error(CheckoutError::MissingPaymentMethod).1.retryable);
        assert_eq!(
            api_error(CheckoutError::Other("boom".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
