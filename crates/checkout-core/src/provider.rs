//! Payment Provider Strategy Pattern
//!
//! The checkout talks to two external collaborators through these traits:
//!
//! - [`CommerceProvider`]: credential setup, purchase/order intents, orders
//! - [`TokenizationProvider`]: card tokens, payment methods, intent verification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_core::provider::{CommerceProvider, TokenizationProvider};
//!
//! let commerce = Arc::new(CommerceClient::from_config(&config)?);
//! let tokenizer = Arc::new(TokenizationClient::from_config(&config)?);
//! let flow = CheckoutFlow::new(commerce, tokenizer, FlowConfig::default());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::card::CardForm;
use crate::error::Result;
use crate::intent::{Mandate, OrderIntent};
use crate::order::{CreateOrderRequest, Order, PaymentReceipt};
use crate::payment_method::PaymentToken;

/// Short-lived credentials issued by the commerce provider's setup endpoint
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// JWT authorizing tokenization-provider calls
    pub jwt: String,

    /// Public key initializing the tokenization widget
    pub tokenization_api_key: String,

    /// Tokenization project; absent in some setups
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("jwt", &"<redacted>")
            .field("tokenization_api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Session JWT from the auth provider of a signed-in user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a bearer token, rejecting blanks
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Opaque token issued for a card
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardToken {
    pub id: String,
}

/// Payment method registered with the tokenization provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredPaymentMethod {
    pub id: String,

    #[serde(default)]
    pub token_id: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub last4: Option<String>,
}

/// Purchase-intent request for a freshly registered card
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseIntentRequest {
    pub payment_method_id: String,
    pub card_holder_name: String,
}

/// Order-intent request placing a mandate on an existing payment method
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntentRequest {
    pub payment_method_id: String,
    pub mandates: Vec<Mandate>,
}

/// Result of an intent verification attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerificationOutcome {
    Verified,
    Failed { reason: String },
}

/// Strategy trait for the commerce provider
#[async_trait]
pub trait CommerceProvider: Send + Sync {
    /// Fetch a short-lived JWT and tokenization API key
    async fn setup(&self) -> Result<Credentials>;

    /// Create a purchase intent for a registered card
    async fn create_purchase_intent(&self, request: &PurchaseIntentRequest) -> Result<OrderIntent>;

    /// Create an order intent with a spending mandate for a signed-in user
    async fn create_order_intent(
        &self,
        auth: &AuthToken,
        request: &OrderIntentRequest,
    ) -> Result<OrderIntent>;

    /// Create an order
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order>;

    /// Submit payment for an existing order
    async fn submit_payment(&self, order_id: &str, token: &PaymentToken) -> Result<PaymentReceipt>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Strategy trait for the card tokenization provider
#[async_trait]
pub trait TokenizationProvider: Send + Sync {
    /// Exchange card fields for an opaque token
    async fn tokenize_card(&self, credentials: &Credentials, card: &CardForm) -> Result<CardToken>;

    /// Register a token as a payment method owned by `entity_id`
    ///
    /// `bearer` is the setup JWT or the signed-in user's session token.
    async fn register_payment_method(
        &self,
        project_id: &str,
        bearer: &str,
        entity_id: &str,
        token_id: &str,
    ) -> Result<RegisteredPaymentMethod>;

    /// List payment methods owned by `entity_id`
    async fn list_payment_methods(
        &self,
        project_id: &str,
        auth: &AuthToken,
        entity_id: &str,
    ) -> Result<Vec<RegisteredPaymentMethod>>;

    /// Run the extra verification step for an intent
    async fn verify_intent(
        &self,
        project_id: &str,
        bearer: &str,
        intent_id: &str,
    ) -> Result<VerificationOutcome>;

    /// Provider name
    fn name(&self) -> &str;
}
