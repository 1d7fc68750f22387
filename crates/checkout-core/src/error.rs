//! Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout error types
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Credential bootstrap against the commerce provider failed
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// Card fields not ready or cardholder name empty
    #[error("Card elements not ready: {0}")]
    ElementsNotReady(String),

    /// Provider answered with a non-success status
    #[error("{operation} failed: {status} {body}")]
    Provider {
        operation: String,
        status: u16,
        body: String,
    },

    /// Provider could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Provider response did not match the expected schema
    #[error("Unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// Intent verification was rejected
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// No payment method reference could be resolved for the order stage
    #[error("Missing payment method; please go back and register a card first")]
    MissingPaymentMethod,

    /// Order response carried no order id
    #[error("Order ID missing in response")]
    MissingOrderId,

    /// Payment-method management requires a signed-in user
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    /// User-entered data failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the session's current stage
    #[error("Invalid checkout state: {0}")]
    InvalidState(String),

    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session store error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl CheckoutError {
    /// Build a provider error from a non-success response
    pub fn provider(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Check if the user can simply try the same step again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Bootstrap(_)
                | CheckoutError::Network(_)
                | CheckoutError::VerificationFailed(_)
                | CheckoutError::Provider { .. }
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Bootstrap(_) => {
                "Could not load the payment form. Please reload the page.".into()
            }
            CheckoutError::ElementsNotReady(_) => {
                "Please complete all card fields and the cardholder name.".into()
            }
            // Provider errors are surfaced verbatim, status and body included
            CheckoutError::Provider { .. } | CheckoutError::MissingOrderId => self.to_string(),
            CheckoutError::Network(_) => {
                "The payment service is currently unreachable. Please try again.".into()
            }
            CheckoutError::VerificationFailed(msg) => {
                format!("Verification failed: {msg}. Please try again.")
            }
            CheckoutError::MissingPaymentMethod => {
                "Payment method missing. Make sure to register a card first.".into()
            }
            CheckoutError::Unauthenticated(_) => "Please sign in to manage payment methods.".into(),
            CheckoutError::InvalidInput(msg) => format!("Please check your input: {msg}."),
            CheckoutError::SessionNotFound(_) => {
                "Your checkout session has expired. Please start again.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message_carries_status_and_body() {
        let err = CheckoutError::provider("Create order", 422, "bad locator");
        assert_eq!(err.to_string(), "Create order failed: 422 bad locator");
        assert_eq!(err.user_message(), "Create order failed: 422 bad locator");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_payment_method_is_not_retryable() {
        assert!(!CheckoutError::MissingPaymentMethod.is_retryable());
    }
}
