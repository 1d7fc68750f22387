//! Order Page

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

use crate::api::{self, OrderInput, OrderPageState};
use crate::components::Field;

#[component]
pub fn OrderPage() -> impl IntoView {
    let query = use_query_map();
    let payment_method = move || query.with(|q| q.get("paymentMethod"));

    let (page, set_page) = signal(OrderPageState::default());
    let (submitting, set_submitting) = signal(false);
    let (result, set_result) = signal(None::<Result<String, String>>);

    let product_url = RwSignal::new(String::new());
    let note = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());

    leptos::task::spawn_local(async move {
        match api::order_page(payment_method().as_deref()).await {
            Ok(state) => set_page.set(state),
            Err(e) => set_page.set(OrderPageState {
                error: Some(e),
                ..Default::default()
            }),
        }
    });

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if submitting.get() || !page.get().can_submit {
            return;
        }

        let note = note.get();
        let order = OrderInput {
            product_url: product_url.get(),
            note: (!note.trim().is_empty()).then_some(note),
            email: email.get(),
        };
        set_result.set(None);
        set_submitting.set(true);

        leptos::task::spawn_local(async move {
            let outcome = api::submit_order(payment_method().as_deref(), &order)
                .await
                .map(|submitted| format!("{} ({})", submitted.message, submitted.order_id));
            set_result.set(Some(outcome));
            set_submitting.set(false);
        });
    };

    let method_label = move || {
        page.get()
            .payment_method
            .and_then(|m| m["type"].as_str().map(str::to_string))
            .map(|kind| format!("Paying with a {kind} payment method"))
    };

    view! {
        <div class="order">
            <h1>"Place Order"</h1>

            {move || page.get().error.map(|e| view! { <p class="error">{e}</p> })}
            {move || method_label().map(|label| view! { <p class="meta">{label}</p> })}

            <form class="order-form" on:submit=submit>
                <Field label="Product URL" kind="url" placeholder="https://..." value=product_url />
                <Field label="Note" placeholder="Size, colour, ..." value=note />
                <Field label="Email" kind="email" placeholder="you@example.com" value=email />
                <button
                    type="submit"
                    class="btn btn-primary"
                    disabled=move || submitting.get() || !page.get().can_submit
                >
                    {move || if submitting.get() { "Submitting…" } else { "Submit Order" }}
                </button>
            </form>

            {move || result.get().map(|r| match r {
                Ok(message) => view! { <p class="success">{message}</p> }.into_any(),
                Err(e) => view! { <p class="error">{e}</p> }.into_any(),
            })}
        </div>
    }
}
