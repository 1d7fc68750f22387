//! Home Page: basic card checkout

use leptos::prelude::*;

use crate::components::CardCapture;

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="checkout">
            <header class="hero">
                <h1>"Checkout"</h1>
                <p class="tagline">"Enter your card. It is tokenized before it reaches our servers."</p>
            </header>

            <CardCapture mode="basic" />

            <p class="alt">
                <a href="/agentic">"Let an agent pay for you instead"</a>
            </p>
        </div>
    }
}
