//! Agentic Page
//!
//! Same capture form, but the card is turned into a purchase intent that
//! has to be verified before the order page opens.

use leptos::prelude::*;

use crate::components::{CardCapture, SavedMethods};

#[component]
pub fn AgenticPage() -> impl IntoView {
    view! {
        <div class="checkout">
            <header class="hero">
                <h1>"Agentic Checkout"</h1>
                <p class="tagline">"Authorize an agent to pay with this card."</p>
            </header>

            <CardCapture mode="agentic" />

            <SavedMethods mode="agentic" />

            <p class="alt">
                <a href="/">"Pay with a card directly"</a>
            </p>
        </div>
    }
}
