//! API Client
//!
//! Thin wrappers over the checkout server. The session id lives in
//! `sessionStorage`, so each browser tab runs its own checkout. A bearer
//! token entered for saved payment methods is kept there too.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

const SESSION_HEADER: &str = "x-checkout-session";
const SESSION_KEY: &str = "checkout.session";
const AUTH_KEY: &str = "checkout.auth";

/// Session details returned by the setup stage
#[derive(Clone, Debug, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub project_id: Option<String>,
    pub environment: String,
}

/// Result of a card capture or verification step
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum CaptureOutcome {
    Completed { redirect: String },
    VerificationRequired { intent_id: String },
}

/// Card fields as typed into the capture form
#[derive(Clone, Debug, Default)]
pub struct CardInput {
    pub number: String,
    pub month: String,
    pub year: String,
    pub cvc: String,
    pub cardholder_name: String,
}

impl CardInput {
    /// Wire shape of the card form; a field counts as ready once filled in
    fn to_json(&self) -> serde_json::Value {
        let element = |value: &str| json!({ "ready": !value.trim().is_empty(), "value": value.trim() });
        let month: u8 = self.month.trim().parse().unwrap_or(0);
        let year: u16 = self.year.trim().parse().unwrap_or(0);
        json!({
            "number": element(&self.number),
            "expiration": { "ready": month > 0 && year > 0, "month": month, "year": year },
            "cvc": element(&self.cvc),
            "cardholderName": self.cardholder_name,
        })
    }
}

/// What the order page should show
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderPageState {
    pub payment_method: Option<serde_json::Value>,
    pub can_submit: bool,
    pub error: Option<String>,
}

/// Order details typed into the order form
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub product_url: String,
    pub note: Option<String>,
    pub email: String,
}

/// Payment method saved for the signed-in user
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMethod {
    pub id: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
}

impl SavedMethod {
    pub fn label(&self) -> String {
        format!(
            "{} •••• {}",
            self.brand.as_deref().unwrap_or("Card"),
            self.last4.as_deref().unwrap_or("????")
        )
    }
}

#[derive(Deserialize)]
struct SavedMethods {
    data: Vec<SavedMethod>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrderSubmitted {
    pub order_id: String,
    pub message: String,
}

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.session_storage().ok()?
}

fn stored_session() -> Option<String> {
    storage()?.get_item(SESSION_KEY).ok()?
}

fn remember_session(id: &str) {
    if let Some(storage) = storage() {
        let _ = storage.set_item(SESSION_KEY, id);
    }
}

fn stored_token() -> Option<String> {
    storage()?.get_item(AUTH_KEY).ok()?.filter(|t| !t.is_empty())
}

/// Keep the user's bearer token for this tab; an empty token signs out
pub fn sign_in(token: &str) {
    if let Some(storage) = storage() {
        let _ = match token.trim() {
            "" => storage.remove_item(AUTH_KEY),
            token => storage.set_item(AUTH_KEY, token),
        };
    }
}

pub fn signed_in() -> bool {
    stored_token().is_some()
}

fn endpoint(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{origin}{path}")
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, String> {
    let request = match stored_session() {
        Some(id) => request.header(SESSION_HEADER, id),
        None => request,
    };
    let request = match stored_token() {
        Some(token) => request.header("authorization", format!("Bearer {token}")),
        None => request,
    };

    let response = request.send().await.map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(data["error"].as_str().unwrap_or("Request failed").to_string())
    }
}

/// Start or resume this tab's checkout and fetch fresh credentials
pub async fn start_session() -> Result<SessionInfo, String> {
    let info: SessionInfo = send(reqwest::Client::new().post(endpoint("/api/session"))).await?;
    remember_session(&info.session_id);
    Ok(info)
}

/// Submit the card form
pub async fn capture_card(mode: &str, card: &CardInput) -> Result<CaptureOutcome, String> {
    let body = json!({ "mode": mode, "card": card.to_json() });
    send(reqwest::Client::new().post(endpoint("/api/checkout/card")).json(&body)).await
}

/// Confirm the pending intent once the verification widget closed
pub async fn confirm_verification() -> Result<CaptureOutcome, String> {
    send(reqwest::Client::new().post(endpoint("/api/checkout/verify"))).await
}

/// Saved payment methods of the signed-in user
pub async fn saved_methods() -> Result<Vec<SavedMethod>, String> {
    let list: SavedMethods = send(reqwest::Client::new().get(endpoint("/api/payment-methods"))).await?;
    Ok(list.data)
}

/// Save a card for the signed-in user
pub async fn save_method(card: &CardInput) -> Result<SavedMethod, String> {
    let body = json!({ "card": card.to_json() });
    send(reqwest::Client::new().post(endpoint("/api/payment-methods")).json(&body)).await
}

/// Use a saved payment method for this checkout
pub async fn select_method(id: &str, mode: &str) -> Result<CaptureOutcome, String> {
    let body = json!({ "paymentMethodId": id, "mode": mode });
    send(reqwest::Client::new().post(endpoint("/api/payment-methods/select")).json(&body)).await
}

/// Order page state for the `paymentMethod` query value, if any
pub async fn order_page(payment_method: Option<&str>) -> Result<OrderPageState, String> {
    let mut request = reqwest::Client::new().get(endpoint("/api/order"));
    if let Some(value) = payment_method {
        request = request.query(&[("paymentMethod", value)]);
    }
    send(request).await
}

/// Create the order and pay for it
pub async fn submit_order(payment_method: Option<&str>, order: &OrderInput) -> Result<OrderSubmitted, String> {
    let mut request = reqwest::Client::new().post(endpoint("/api/order"));
    if let Some(value) = payment_method {
        request = request.query(&[("paymentMethod", value)]);
    }
    send(request.json(order)).await
}

/// Full-page navigation
pub fn navigate(path: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(path);
    }
}
