//! Commerce Provider Client
//!
//! Implementation of [`CommerceProvider`] over the provider's REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use checkout_core::{
    AuthToken, CommerceProvider, CreateOrderRequest, Credentials, IntentPhase, Order,
    OrderIntent, PaymentReceipt, PaymentToken, Result,
    provider::{OrderIntentRequest, PurchaseIntentRequest},
};

use crate::config::CommerceConfig;
use crate::http::{build_client, decode, network};

const SETUP_PATH: &str = "/api/unstable/setupTokenizeCard";
const PURCHASE_INTENT_PATH: &str = "/api/unstable/setupTokenizeCard/createPurchaseIntent";
const ORDER_INTENT_PATH: &str = "/api/unstable/order-intents";
const ORDERS_PATH: &str = "/api/2022-06-09/orders";

/// Setup response as sent on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetupResponse {
    jwt: String,
    #[serde(rename = "basisTheoryAPIKey")]
    tokenization_api_key: String,
    #[serde(rename = "basisTheoryProjectId", default)]
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseIntentResponse {
    purchase_intent_id: String,
    #[serde(default)]
    phase: IntentPhase,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderIntentResponse {
    order_intent_id: String,
    #[serde(default)]
    phase: IntentPhase,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    #[serde(default)]
    order: Option<OrderBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderBody {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    phase: Option<String>,
}

#[derive(Debug, Serialize)]
struct PaymentRequest<'a> {
    token: &'a PaymentToken,
}

/// Payment path for an order; the provider-issued id is escaped as one segment
fn payment_path(order_id: &str) -> String {
    format!("/api/unstable/orders/{}/payment", urlencoding::encode(order_id))
}

/// Commerce provider REST client
pub struct CommerceClient {
    client: reqwest::Client,
    config: CommerceConfig,
}

impl CommerceClient {
    pub fn from_config(config: CommerceConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(CommerceConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl CommerceProvider for CommerceClient {
    async fn setup(&self) -> Result<Credentials> {
        const OP: &str = "Setup tokenize card";
        let response = self
            .client
            .get(self.url(SETUP_PATH))
            .header("x-api-key", &self.config.client_api_key)
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let setup: SetupResponse = decode(OP, response).await?;

        Ok(Credentials {
            jwt: setup.jwt,
            tokenization_api_key: setup.tokenization_api_key,
            project_id: setup.project_id,
        })
    }

    async fn create_purchase_intent(&self, request: &PurchaseIntentRequest) -> Result<OrderIntent> {
        const OP: &str = "Create purchase intent";
        let response = self
            .client
            .post(self.url(PURCHASE_INTENT_PATH))
            .header("x-api-key", &self.config.client_api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let intent: PurchaseIntentResponse = decode(OP, response).await?;

        tracing::debug!(intent_id = %intent.purchase_intent_id, phase = ?intent.phase, "Purchase intent created");
        Ok(OrderIntent::new(intent.purchase_intent_id, intent.phase))
    }

    async fn create_order_intent(
        &self,
        auth: &AuthToken,
        request: &OrderIntentRequest,
    ) -> Result<OrderIntent> {
        const OP: &str = "Create order intent";
        let response = self
            .client
            .post(self.url(ORDER_INTENT_PATH))
            .header("x-api-key", &self.config.client_api_key)
            .bearer_auth(auth.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let intent: OrderIntentResponse = decode(OP, response).await?;

        tracing::debug!(intent_id = %intent.order_intent_id, phase = ?intent.phase, "Order intent created");
        Ok(OrderIntent::new(intent.order_intent_id, intent.phase))
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        const OP: &str = "Create order";
        let response = self
            .client
            .post(self.url(ORDERS_PATH))
            .header("x-client-secret", &self.config.client_secret)
            .json(request)
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let created: CreateOrderResponse = decode(OP, response).await?;

        // A missing id surfaces as an empty one; the workflow rejects it
        let order = created.order.unwrap_or(OrderBody {
            order_id: None,
            phase: None,
        });
        Ok(Order {
            order_id: order.order_id.unwrap_or_default(),
            phase: order.phase,
        })
    }

    async fn submit_payment(&self, order_id: &str, token: &PaymentToken) -> Result<PaymentReceipt> {
        const OP: &str = "Payment";
        let response = self
            .client
            .post(self.url(&payment_path(order_id)))
            .header("x-client-secret", &self.config.client_secret)
            .json(&PaymentRequest { token })
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let body: serde_json::Value = decode(OP, response).await?;
        Ok(PaymentReceipt(body))
    }

    fn name(&self) -> &str {
        "commerce"
    }
}
