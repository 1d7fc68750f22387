//! Mock Providers
//!
//! In-memory commerce and tokenization providers for demos and local runs.
//! Intents always require verification.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use checkout_core::{
    AuthToken, CardForm, CardToken, CheckoutError, CommerceProvider, CreateOrderRequest,
    Credentials, IntentPhase, Order, OrderIntent, PaymentReceipt, PaymentToken,
    RegisteredPaymentMethod, Result, TokenizationProvider, VerificationOutcome,
    provider::{OrderIntentRequest, PurchaseIntentRequest},
};

const MOCK_PROJECT: &str = "mock-project";

fn short_id(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..12])
}

/// Mock commerce provider
#[derive(Default)]
pub struct MockCommerce {
    orders: Mutex<HashMap<String, CreateOrderRequest>>,
}

impl MockCommerce {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.lock().await.len()
    }
}

#[async_trait]
impl CommerceProvider for MockCommerce {
    async fn setup(&self) -> Result<Credentials> {
        Ok(Credentials {
            jwt: short_id("jwt"),
            tokenization_api_key: short_id("key"),
            project_id: Some(MOCK_PROJECT.into()),
        })
    }

    async fn create_purchase_intent(&self, _request: &PurchaseIntentRequest) -> Result<OrderIntent> {
        Ok(OrderIntent::new(short_id("pi"), IntentPhase::RequiresVerification))
    }

    async fn create_order_intent(
        &self,
        _auth: &AuthToken,
        request: &OrderIntentRequest,
    ) -> Result<OrderIntent> {
        if request.mandates.is_empty() {
            return Err(CheckoutError::provider("Create order intent", 400, "mandates required"));
        }
        Ok(OrderIntent::new(short_id("oi"), IntentPhase::RequiresVerification))
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        if !request.line_items.product_locator.starts_with("url:http") {
            return Err(CheckoutError::provider(
                "Create order",
                400,
                "productLocator must reference a product URL",
            ));
        }
        let order_id = short_id("ord");
        self.orders.lock().await.insert(order_id.clone(), request.clone());
        Ok(Order {
            order_id,
            phase: Some("payment".into()),
        })
    }

    async fn submit_payment(&self, order_id: &str, token: &PaymentToken) -> Result<PaymentReceipt> {
        if !self.orders.lock().await.contains_key(order_id) {
            return Err(CheckoutError::provider("Payment", 404, format!("order {order_id} not found")));
        }
        Ok(PaymentReceipt(serde_json::json!({
            "orderId": order_id,
            "token": token.as_str(),
            "status": "completed",
        })))
    }

    fn name(&self) -> &str {
        "mock-commerce"
    }
}

/// Mock tokenization provider
#[derive(Default)]
pub struct MockTokenizer {
    /// token id -> last four digits
    tokens: Mutex<HashMap<String, String>>,
    /// payment method id -> record
    methods: Mutex<HashMap<String, RegisteredPaymentMethod>>,
    /// intent ids to reject at the next verification
    declined: Mutex<Vec<String>>,
}

impl MockTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an intent for rejection at verification
    pub async fn decline_intent(&self, intent_id: impl Into<String>) {
        self.declined.lock().await.push(intent_id.into());
    }
}

#[async_trait]
impl TokenizationProvider for MockTokenizer {
    async fn tokenize_card(&self, _credentials: &Credentials, card: &CardForm) -> Result<CardToken> {
        let digits: Vec<char> = card.number.value.trim().chars().collect();
        let last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        let id = short_id("tok");
        self.tokens.lock().await.insert(id.clone(), last4);
        Ok(CardToken { id })
    }

    async fn register_payment_method(
        &self,
        _project_id: &str,
        _bearer: &str,
        _entity_id: &str,
        token_id: &str,
    ) -> Result<RegisteredPaymentMethod> {
        let last4 = self
            .tokens
            .lock()
            .await
            .get(token_id)
            .cloned()
            .ok_or_else(|| CheckoutError::provider("Create payment method", 404, "unknown token"))?;

        let method = RegisteredPaymentMethod {
            id: short_id("pm"),
            token_id: Some(token_id.to_string()),
            brand: Some("visa".into()),
            last4: Some(last4),
        };
        self.methods.lock().await.insert(method.id.clone(), method.clone());
        Ok(method)
    }

    async fn list_payment_methods(
        &self,
        _project_id: &str,
        _auth: &AuthToken,
        _entity_id: &str,
    ) -> Result<Vec<RegisteredPaymentMethod>> {
        let mut methods: Vec<_> = self.methods.lock().await.values().cloned().collect();
        methods.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(methods)
    }

    async fn verify_intent(
        &self,
        _project_id: &str,
        _bearer: &str,
        intent_id: &str,
    ) -> Result<VerificationOutcome> {
        let mut declined = self.declined.lock().await;
        if let Some(pos) = declined.iter().position(|id| id == intent_id) {
            // declines once, so a retry goes through
            declined.remove(pos);
            return Ok(VerificationOutcome::Failed {
                reason: "challenge declined".into(),
            });
        }
        Ok(VerificationOutcome::Verified)
    }

    fn name(&self) -> &str {
        "mock-tokenization"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::{CardElement, ExpirationElement, OrderForm, PaymentMethod};

    fn card(number: &str) -> CardForm {
        CardForm {
            number: CardElement::ready(number),
            expiration: ExpirationElement::ready(1, 2031),
            cvc: CardElement::ready("999"),
            cardholder_name: "Jane Doe".into(),
        }
    }

    #[tokio::test]
    async fn test_registered_method_is_listed() {
        let tokenizer = MockTokenizer::new();
        let creds = MockCommerce::new().setup().await.unwrap();

        let token = tokenizer.tokenize_card(&creds, &card("4242424242424242")).await.unwrap();
        let method = tokenizer
            .register_payment_method(MOCK_PROJECT, &creds.jwt, "demo", &token.id)
            .await
            .unwrap();
        assert_eq!(method.last4.as_deref(), Some("4242"));

        let auth = AuthToken::new("user").unwrap();
        let listed = tokenizer.list_payment_methods(MOCK_PROJECT, &auth, "demo").await.unwrap();
        assert_eq!(listed, vec![method]);
    }

    #[tokio::test]
    async fn test_declined_intent_fails_once() {
        let tokenizer = MockTokenizer::new();
        tokenizer.decline_intent("pi_1").await;

        let first = tokenizer.verify_intent(MOCK_PROJECT, "jwt", "pi_1").await.unwrap();
        assert!(matches!(first, VerificationOutcome::Failed { .. }));
        let second = tokenizer.verify_intent(MOCK_PROJECT, "jwt", "pi_1").await.unwrap();
        assert_eq!(second, VerificationOutcome::Verified);
    }

    #[tokio::test]
    async fn test_payment_requires_existing_order() {
        let commerce = MockCommerce::new();
        let token = PaymentMethod::basic("tok_1").payment_token();
        assert!(commerce.submit_payment("ord_missing", &token).await.is_err());

        let order = commerce
            .create_order(&CreateOrderRequest::from_form(&OrderForm {
                product_url: "https://example.com/item".into(),
                note: None,
                email: "jane@example.com".into(),
            }))
            .await
            .unwrap();
        let receipt = commerce.submit_payment(&order.order_id, &token).await.unwrap();
        assert_eq!(receipt.0["token"], "tok_1");
        assert_eq!(commerce.order_count().await, 1);
    }
}
