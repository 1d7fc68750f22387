//! Checkout Workflow
//!
//! Drives a [`CheckoutSession`] through the three stages:
//!
//! ```text
//! ┌──────────┐     ┌──────────────────────┐     ┌──────────────┐
//! │  Setup   │────▶│  Capture             │────▶│  Order       │
//! │ (JWT +   │     │  tokenize → register │     │  create →    │
//! │  API key)│     │  → intent → verify?  │     │  pay         │
//! └──────────┘     └──────────────────────┘     └──────────────┘
//! ```
//!
//! Every method takes the session by `&mut` and leaves it in the state the
//! next call expects; persisting it is the caller's job.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::card::CardForm;
use crate::error::{CheckoutError, Result};
use crate::intent::{Mandate, OrderIntent};
use crate::order::{CreateOrderRequest, OrderConfirmation, OrderForm};
use crate::payment_method::{self, PaymentMethod};
use crate::provider::{
    AuthToken, CommerceProvider, OrderIntentRequest, PurchaseIntentRequest,
    RegisteredPaymentMethod, TokenizationProvider, VerificationOutcome,
};
use crate::session::{CaptureMode, CheckoutSession, CheckoutStage, OrderStatus};

/// Workflow configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Owner entity for registered payment methods (the JWT subject)
    pub entity_id: String,

    /// Mandate used when a selection does not provide one
    #[serde(default)]
    pub default_mandate: Mandate,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            entity_id: "checkout-demo".into(),
            default_mandate: Mandate::default(),
        }
    }
}

/// Result of a capture-stage step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum CaptureOutcome {
    /// Payment method stored; continue to `redirect`
    Completed {
        payment_method: PaymentMethod,
        redirect: String,
    },

    /// Render the verification widget for this intent, then call
    /// [`CheckoutFlow::confirm_verification`]
    VerificationRequired {
        intent_id: String,
        project_id: String,
    },
}

/// The checkout workflow
pub struct CheckoutFlow {
    commerce: Arc<dyn CommerceProvider>,
    tokenizer: Arc<dyn TokenizationProvider>,
    config: FlowConfig,
}

impl CheckoutFlow {
    pub fn new(
        commerce: Arc<dyn CommerceProvider>,
        tokenizer: Arc<dyn TokenizationProvider>,
        config: FlowConfig,
    ) -> Self {
        Self {
            commerce,
            tokenizer,
            config,
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn provider_names(&self) -> (&str, &str) {
        (self.commerce.name(), self.tokenizer.name())
    }

    // ------------------------------------------------------------------
    // Stage 1: credential bootstrap
    // ------------------------------------------------------------------

    /// Fetch credentials for the tokenization widget
    pub async fn bootstrap(&self, session: &mut CheckoutSession) -> Result<()> {
        let credentials = self.commerce.setup().await.map_err(|e| {
            tracing::error!(session_id = %session.id, error = %e, "Failed to fetch checkout credentials");
            match e {
                CheckoutError::Bootstrap(_) => e,
                other => CheckoutError::Bootstrap(other.to_string()),
            }
        })?;

        tracing::info!(
            session_id = %session.id,
            project_id = ?credentials.project_id,
            "Checkout credentials issued"
        );
        session.set_credentials(credentials);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stage 2: card capture
    // ------------------------------------------------------------------

    /// Tokenize a card and turn it into a payment method
    pub async fn capture_card(
        &self,
        session: &mut CheckoutSession,
        form: &CardForm,
        mode: CaptureMode,
    ) -> Result<CaptureOutcome> {
        if let Err(e) = form.validate() {
            tracing::warn!(session_id = %session.id, error = %e, "Card submission aborted");
            return Err(e);
        }

        let credentials = session.credentials()?.clone();
        let project_id = required_project(credentials.project_id.as_deref())?;

        let token = self.tokenizer.tokenize_card(&credentials, form).await?;
        tracing::debug!(session_id = %session.id, token_id = %token.id, "Card tokenized");

        let registered = self
            .tokenizer
            .register_payment_method(project_id, &credentials.jwt, &self.config.entity_id, &token.id)
            .await?;
        tracing::info!(
            session_id = %session.id,
            payment_method_id = %registered.id,
            "Payment method registered"
        );

        match mode {
            CaptureMode::Basic => self.complete(session, PaymentMethod::basic(token.id)),
            CaptureMode::Agentic => {
                let intent = self
                    .commerce
                    .create_purchase_intent(&PurchaseIntentRequest {
                        payment_method_id: registered.id,
                        card_holder_name: form.cardholder_name().to_string(),
                    })
                    .await?;
                self.gate_on_verification(session, intent, project_id, credentials.jwt.clone())
            }
        }
    }

    /// Run the verification step for the pending intent
    ///
    /// On failure the session stays in `AwaitingVerification` so the user
    /// can retry.
    pub async fn confirm_verification(&self, session: &mut CheckoutSession) -> Result<CaptureOutcome> {
        let CheckoutStage::AwaitingVerification {
            intent,
            project_id,
            bearer,
        } = session.stage.clone()
        else {
            return Err(CheckoutError::InvalidState(format!(
                "no intent awaiting verification (stage: {})",
                session.stage.name()
            )));
        };

        match self.tokenizer.verify_intent(&project_id, &bearer, &intent.id).await? {
            VerificationOutcome::Verified => {
                tracing::info!(session_id = %session.id, intent_id = %intent.id, "Intent verified");
                self.complete(session, PaymentMethod::agentic(intent.id))
            }
            VerificationOutcome::Failed { reason } => {
                tracing::warn!(
                    session_id = %session.id,
                    intent_id = %intent.id,
                    reason = %reason,
                    "Intent verification failed"
                );
                Err(CheckoutError::VerificationFailed(reason))
            }
        }
    }

    // ------------------------------------------------------------------
    // Stage 2 (alternate): payment-method management
    // ------------------------------------------------------------------

    /// List the signed-in user's payment methods
    pub async fn list_payment_methods(
        &self,
        session: &CheckoutSession,
        auth: Option<&AuthToken>,
    ) -> Result<Vec<RegisteredPaymentMethod>> {
        let auth = signed_in(auth)?;
        let project_id = required_project(session.credentials()?.project_id.as_deref())?;
        self.tokenizer
            .list_payment_methods(project_id, auth, &self.config.entity_id)
            .await
    }

    /// Tokenize a card and add it to the signed-in user's payment methods
    pub async fn add_payment_method(
        &self,
        session: &CheckoutSession,
        auth: Option<&AuthToken>,
        form: &CardForm,
    ) -> Result<RegisteredPaymentMethod> {
        let auth = signed_in(auth)?;
        form.validate()?;

        let credentials = session.credentials()?;
        let project_id = required_project(credentials.project_id.as_deref())?;
        let token = self.tokenizer.tokenize_card(credentials, form).await?;

        let mut registered = self
            .tokenizer
            .register_payment_method(project_id, auth.as_str(), &self.config.entity_id, &token.id)
            .await?;
        registered.token_id.get_or_insert(token.id);

        tracing::info!(session_id = %session.id, payment_method_id = %registered.id, "Payment method added");
        Ok(registered)
    }

    /// Use an existing payment method for this checkout
    pub async fn select_payment_method(
        &self,
        session: &mut CheckoutSession,
        auth: Option<&AuthToken>,
        selected: &RegisteredPaymentMethod,
        mode: CaptureMode,
        mandate: Option<Mandate>,
    ) -> Result<CaptureOutcome> {
        let auth = signed_in(auth)?;

        match mode {
            CaptureMode::Basic => {
                let token_id = selected.token_id.clone().unwrap_or_else(|| selected.id.clone());
                self.complete(session, PaymentMethod::basic(token_id))
            }
            CaptureMode::Agentic => {
                let mandate = mandate.unwrap_or_else(|| self.config.default_mandate.clone());
                if !mandate.is_valid() {
                    return Err(CheckoutError::InvalidInput(
                        "mandate needs a positive limit and a currency".into(),
                    ));
                }

                let project_id = required_project(session.credentials()?.project_id.as_deref())?.to_string();
                let intent = self
                    .commerce
                    .create_order_intent(
                        auth,
                        &OrderIntentRequest {
                            payment_method_id: selected.id.clone(),
                            mandates: vec![mandate],
                        },
                    )
                    .await?;
                self.gate_on_verification(session, intent, &project_id, auth.as_str().to_string())
            }
        }
    }

    /// Look up a saved payment method by id and select it
    pub async fn select_saved_payment_method(
        &self,
        session: &mut CheckoutSession,
        auth: Option<&AuthToken>,
        payment_method_id: &str,
        mode: CaptureMode,
        mandate: Option<Mandate>,
    ) -> Result<CaptureOutcome> {
        let selected = self
            .list_payment_methods(session, auth)
            .await?
            .into_iter()
            .find(|m| m.id == payment_method_id)
            .ok_or_else(|| {
                CheckoutError::InvalidInput(format!("unknown payment method {payment_method_id}"))
            })?;
        self.select_payment_method(session, auth, &selected, mode, mandate)
            .await
    }

    // ------------------------------------------------------------------
    // Stage 3: order submission
    // ------------------------------------------------------------------

    /// Payment method the order stage would use, if any
    pub fn resolve_payment_method(
        &self,
        session: &CheckoutSession,
        query_value: Option<&str>,
    ) -> Option<PaymentMethod> {
        payment_method::resolve(query_value, session.payment_method.as_ref())
    }

    /// Create the order and pay for it
    ///
    /// Runs [`begin_order`](Self::begin_order) then
    /// [`complete_order`](Self::complete_order) on the same session.
    pub async fn submit_order(
        &self,
        session: &mut CheckoutSession,
        query_value: Option<&str>,
        form: &OrderForm,
    ) -> Result<OrderConfirmation> {
        let method = self.begin_order(session, query_value)?;
        self.complete_order(session, &method, form).await
    }

    /// Resolve the payment method and move the order status to `Submitting`
    ///
    /// Callers that share the session across requests persist it between
    /// this step and [`complete_order`](Self::complete_order).
    pub fn begin_order(
        &self,
        session: &mut CheckoutSession,
        query_value: Option<&str>,
    ) -> Result<PaymentMethod> {
        let Some(method) = self.resolve_payment_method(session, query_value) else {
            tracing::warn!(session_id = %session.id, "Order submitted without a payment method");
            return Err(CheckoutError::MissingPaymentMethod);
        };
        session.set_order_status(OrderStatus::Submitting);
        Ok(method)
    }

    /// Place and pay the order; the status ends as `Succeeded` or `Failed`
    ///
    /// A failed status can be resubmitted.
    pub async fn complete_order(
        &self,
        session: &mut CheckoutSession,
        method: &PaymentMethod,
        form: &OrderForm,
    ) -> Result<OrderConfirmation> {
        match self.place_order(method, form).await {
            Ok(confirmation) => {
                tracing::info!(
                    session_id = %session.id,
                    order_id = %confirmation.order_id,
                    payment_method = method.kind(),
                    "Order paid"
                );
                session.set_order_status(OrderStatus::Succeeded {
                    confirmation: confirmation.clone(),
                });
                Ok(confirmation)
            }
            Err(e) => {
                tracing::error!(session_id = %session.id, error = %e, "Order submission failed");
                session.set_order_status(OrderStatus::Failed {
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    async fn place_order(&self, method: &PaymentMethod, form: &OrderForm) -> Result<OrderConfirmation> {
        form.validate()?;

        let order = self
            .commerce
            .create_order(&CreateOrderRequest::from_form(form))
            .await?;
        if order.order_id.trim().is_empty() {
            return Err(CheckoutError::MissingOrderId);
        }

        let receipt = self
            .commerce
            .submit_payment(&order.order_id, &method.payment_token())
            .await?;

        Ok(OrderConfirmation {
            order_id: order.order_id,
            payment: receipt.0,
        })
    }

    // ------------------------------------------------------------------

    fn gate_on_verification(
        &self,
        session: &mut CheckoutSession,
        intent: OrderIntent,
        project_id: &str,
        bearer: String,
    ) -> Result<CaptureOutcome> {
        if intent.requires_verification() {
            tracing::info!(session_id = %session.id, intent_id = %intent.id, "Intent requires verification");
            let outcome = CaptureOutcome::VerificationRequired {
                intent_id: intent.id.clone(),
                project_id: project_id.to_string(),
            };
            session.set_stage(CheckoutStage::AwaitingVerification {
                intent,
                project_id: project_id.to_string(),
                bearer,
            });
            Ok(outcome)
        } else {
            self.complete(session, PaymentMethod::agentic(intent.id))
        }
    }

    fn complete(&self, session: &mut CheckoutSession, method: PaymentMethod) -> Result<CaptureOutcome> {
        let redirect = method.order_url()?;
        session.store_payment_method(method.clone());
        tracing::info!(session_id = %session.id, payment_method = method.kind(), "Payment method captured");
        Ok(CaptureOutcome::Completed {
            payment_method: method,
            redirect,
        })
    }
}

fn signed_in(auth: Option<&AuthToken>) -> Result<&AuthToken> {
    auth.ok_or_else(|| CheckoutError::Unauthenticated("no session token; please sign in".into()))
}

fn required_project(project_id: Option<&str>) -> Result<&str> {
    project_id
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CheckoutError::Config("tokenization project id not issued by setup".into()))
}
