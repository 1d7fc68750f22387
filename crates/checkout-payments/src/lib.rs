//! # checkout-payments
//!
//! HTTP clients for the two providers behind the checkout workflow.
//!
//! ```text
//! ┌──────────────┐  x-api-key / x-client-secret  ┌────────────────────┐
//! │ CommerceClient│─────────────────────────────▶│ Commerce provider  │
//! └──────────────┘                               │ setup, intents,    │
//!                                                │ orders, payments   │
//! ┌──────────────────┐  BT-API-KEY / Bearer JWT  ├────────────────────┤
//! │TokenizationClient│──────────────────────────▶│ Tokenization       │
//! └──────────────────┘                           │ tokens, payment    │
//!                                                │ methods, verify    │
//!                                                └────────────────────┘
//! ```
//!
//! Both implement the provider traits from `checkout-core`. The [`mock`]
//! providers implement the same traits in memory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_payments::{CommerceClient, TokenizationClient};
//!
//! let commerce = Arc::new(CommerceClient::from_env()?);
//! let tokenizer = Arc::new(TokenizationClient::from_env()?);
//! let flow = CheckoutFlow::new(commerce, tokenizer, FlowConfig::default());
//! ```

mod commerce;
mod config;
mod http;
pub mod mock;
mod tokenization;

pub use commerce::CommerceClient;
pub use config::{CommerceConfig, TokenizationConfig, TokenizationEnvironment};
pub use mock::{MockCommerce, MockTokenizer};
pub use tokenization::TokenizationClient;
