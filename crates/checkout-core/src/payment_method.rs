//! Payment Method Reference
//!
//! The client-owned value handed from the capture stage to the order stage.
//! It travels in two ways: stored on the [`CheckoutSession`](crate::session::CheckoutSession)
//! and URL-encoded into the `paymentMethod` query parameter of the order page.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Query parameter carrying the serialized payment method
pub const PAYMENT_METHOD_PARAM: &str = "paymentMethod";

/// Path of the order stage
pub const ORDER_PATH: &str = "/order";

/// Prefix the commerce provider expects for intent-backed payments
const INTENT_TOKEN_PREFIX: &str = "vic:";

/// Canonical payment method shape
///
/// ```text
/// {"type":"basic","tokenId":"tok_123"}
/// {"type":"agentic","purchaseIntentId":"pi_456"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card token charged directly
    Basic {
        #[serde(rename = "tokenId")]
        token_id: String,
    },

    /// Purchase/order intent bound to a spending mandate
    Agentic {
        #[serde(rename = "purchaseIntentId")]
        purchase_intent_id: String,
    },
}

impl PaymentMethod {
    pub fn basic(token_id: impl Into<String>) -> Self {
        Self::Basic {
            token_id: token_id.into(),
        }
    }

    pub fn agentic(purchase_intent_id: impl Into<String>) -> Self {
        Self::Agentic {
            purchase_intent_id: purchase_intent_id.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PaymentMethod::Basic { .. } => "basic",
            PaymentMethod::Agentic { .. } => "agentic",
        }
    }

    /// Map to the token format the order payment endpoint expects
    pub fn payment_token(&self) -> PaymentToken {
        match self {
            PaymentMethod::Basic { token_id } => PaymentToken(token_id.clone()),
            PaymentMethod::Agentic { purchase_intent_id } => {
                PaymentToken(format!("{INTENT_TOKEN_PREFIX}{purchase_intent_id}"))
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode the raw (already percent-decoded) query value
    ///
    /// Empty or malformed values resolve to `None` so the caller can fall
    /// back to the session copy.
    pub fn from_query_value(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match Self::from_json(raw) {
            Ok(method) => Some(method),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed paymentMethod query value");
                None
            }
        }
    }

    /// Destination of the capture stage, embedding this value as fallback transport
    pub fn order_url(&self) -> Result<String> {
        let json = self.to_json()?;
        Ok(format!(
            "{ORDER_PATH}?{PAYMENT_METHOD_PARAM}={}",
            urlencoding::encode(&json)
        ))
    }
}

/// Token string submitted with an order payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentToken(String);

impl PaymentToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pick the order-stage payment method: URL first, session second
pub fn resolve(query_value: Option<&str>, stored: Option<&PaymentMethod>) -> Option<PaymentMethod> {
    query_value
        .and_then(PaymentMethod::from_query_value)
        .or_else(|| stored.cloned())
}
