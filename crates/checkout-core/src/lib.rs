//! # checkout-core
//!
//! Provider-agnostic card checkout workflow.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CheckoutFlow                            │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │  Checkout   │  │ CommerceProvider │  │ Tokenization   │  │
//! │  │  Session    │──│   (Strategy)     │──│ Provider       │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The provider traits keep the workflow independent of the concrete HTTP
//! clients in `checkout-payments`; tests drive it with in-memory fakes.

pub mod card;
pub mod error;
pub mod intent;
pub mod order;
pub mod payment_method;
pub mod provider;
pub mod session;
pub mod workflow;

pub use card::{CardElement, CardForm, ExpirationElement};
pub use error::{CheckoutError, Result};
pub use intent::{IntentPhase, Mandate, MandatePeriod, OrderIntent};
pub use order::{CreateOrderRequest, Order, OrderConfirmation, OrderForm, PaymentReceipt};
pub use payment_method::{PaymentMethod, PaymentToken};
pub use provider::{
    AuthToken, CardToken, CommerceProvider, Credentials, RegisteredPaymentMethod,
    TokenizationProvider, VerificationOutcome,
};
pub use session::{
    CaptureMode, CheckoutSession, CheckoutStage, MemorySessionStore, OrderStatus, SessionId,
    SessionStore,
};
pub use workflow::{CaptureOutcome, CheckoutFlow, FlowConfig};
