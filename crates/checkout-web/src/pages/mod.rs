//! Page Components

mod home;
mod agentic;
mod order;

pub use home::HomePage;
pub use agentic::AgenticPage;
pub use order::OrderPage;
