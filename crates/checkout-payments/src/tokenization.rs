//! Card Tokenization Provider Client
//!
//! Implementation of [`TokenizationProvider`] over the provider's REST API.
//! Card fields are posted once to `/tokens`; every later call references the
//! returned token id only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use checkout_core::{
    AuthToken, CardForm, CardToken, Credentials, RegisteredPaymentMethod, Result,
    TokenizationProvider, VerificationOutcome,
};

use crate::config::TokenizationConfig;
use crate::http::{build_client, decode, network};

#[derive(Serialize)]
struct CardData<'a> {
    number: &'a str,
    expiration_month: u8,
    expiration_year: u16,
    cvc: &'a str,
    cardholder_name: &'a str,
}

#[derive(Serialize)]
struct CreateTokenRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: CardData<'a>,
}

#[derive(Deserialize)]
struct CreateTokenResponse {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentMethodRequest<'a> {
    entity_id: &'a str,
    token_id: &'a str,
}

/// Listing may come back bare or wrapped in `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum PaymentMethodList {
    Wrapped { data: Vec<RegisteredPaymentMethod> },
    Bare(Vec<RegisteredPaymentMethod>),
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Tokenization provider REST client
pub struct TokenizationClient {
    client: reqwest::Client,
    config: TokenizationConfig,
}

impl TokenizationClient {
    pub fn from_config(config: TokenizationConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(TokenizationConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl TokenizationProvider for TokenizationClient {
    async fn tokenize_card(&self, credentials: &Credentials, card: &CardForm) -> Result<CardToken> {
        const OP: &str = "Tokenize card";
        let body = CreateTokenRequest {
            kind: "card",
            data: CardData {
                number: card.number.value.trim(),
                expiration_month: card.expiration.month,
                expiration_year: card.expiration.year,
                cvc: card.cvc.value.trim(),
                cardholder_name: card.cardholder_name(),
            },
        };

        let response = self
            .client
            .post(self.url("/tokens"))
            .header("BT-API-KEY", &credentials.tokenization_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let token: CreateTokenResponse = decode(OP, response).await?;
        Ok(CardToken { id: token.id })
    }

    async fn register_payment_method(
        &self,
        project_id: &str,
        bearer: &str,
        entity_id: &str,
        token_id: &str,
    ) -> Result<RegisteredPaymentMethod> {
        const OP: &str = "Create payment method";
        let response = self
            .client
            .post(self.url(&format!("/projects/{project_id}/payment-methods")))
            .bearer_auth(bearer)
            .json(&CreatePaymentMethodRequest { entity_id, token_id })
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let mut method: RegisteredPaymentMethod = decode(OP, response).await?;
        method.token_id.get_or_insert_with(|| token_id.to_string());
        Ok(method)
    }

    async fn list_payment_methods(
        &self,
        project_id: &str,
        auth: &AuthToken,
        entity_id: &str,
    ) -> Result<Vec<RegisteredPaymentMethod>> {
        const OP: &str = "List payment methods";
        let response = self
            .client
            .get(self.url(&format!("/projects/{project_id}/payment-methods")))
            .bearer_auth(auth.as_str())
            .query(&[("entityId", entity_id)])
            .send()
            .await
            .map_err(|e| network(OP, e))?;
        let listed: PaymentMethodList = decode(OP, response).await?;
        Ok(match listed {
            PaymentMethodList::Wrapped { data } | PaymentMethodList::Bare(data) => data,
        })
    }

    async fn verify_intent(
        &self,
        project_id: &str,
        bearer: &str,
        intent_id: &str,
    ) -> Result<VerificationOutcome> {
        const OP: &str = "Verify purchase intent";
        let response = self
            .client
            .post(self.url(&format!(
                "/projects/{project_id}/purchase-intents/{intent_id}/verify"
            )))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| network(OP, e))?;

        // A declined challenge comes back as a client error, not a transport failure
        let status = response.status();
        if status.is_client_error() {
            let reason = response.text().await.unwrap_or_default();
            return Ok(VerificationOutcome::Failed {
                reason: if reason.is_empty() {
                    format!("verification rejected ({})", status.as_u16())
                } else {
                    reason
                },
            });
        }

        let verified: VerifyResponse = decode(OP, response).await?;
        match verified.status.as_deref() {
            None | Some("verified" | "active" | "succeeded") => Ok(VerificationOutcome::Verified),
            Some(other) => Ok(VerificationOutcome::Failed {
                reason: verified.reason.unwrap_or_else(|| format!("intent is {other}")),
            }),
        }
    }

    fn name(&self) -> &str {
        "tokenization"
    }
}
