//! UI Components

use leptos::prelude::*;

use crate::api::{self, CaptureOutcome, CardInput, SavedMethod, SessionInfo};

/// Where the capture form is in its lifecycle
#[derive(Clone, Debug, PartialEq)]
enum CaptureState {
    Loading,
    LoadFailed(String),
    Ready,
    Submitting,
    AwaitingVerification { intent_id: String },
    Verifying,
}

/// Labelled text input bound to a signal
#[component]
pub fn Field(
    label: &'static str,
    #[prop(default = "text")] kind: &'static str,
    #[prop(optional)] placeholder: &'static str,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <div class="field">
            <label>{label}</label>
            <input
                type=kind
                placeholder=placeholder
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        </div>
    }
}

/// Card capture form for one payment-method mode
///
/// `mode` is `"basic"` or `"agentic"`. Agentic capture may stop at a
/// verification step; a failed verification can be retried.
#[component]
pub fn CardCapture(mode: &'static str) -> impl IntoView {
    let (state, set_state) = signal(CaptureState::Loading);
    let (session, set_session) = signal(None::<SessionInfo>);
    let (error, set_error) = signal(None::<String>);

    let number = RwSignal::new(String::new());
    let month = RwSignal::new(String::new());
    let year = RwSignal::new(String::new());
    let cvc = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());

    let load = move || {
        set_state.set(CaptureState::Loading);
        leptos::task::spawn_local(async move {
            match api::start_session().await {
                Ok(info) => {
                    set_session.set(Some(info));
                    set_state.set(CaptureState::Ready);
                }
                Err(e) => set_state.set(CaptureState::LoadFailed(e)),
            }
        });
    };
    load();

    let handle_outcome = move |outcome: CaptureOutcome| match outcome {
        CaptureOutcome::Completed { redirect, .. } => api::navigate(&redirect),
        CaptureOutcome::VerificationRequired { intent_id, .. } => {
            set_state.set(CaptureState::AwaitingVerification { intent_id });
        }
    };

    let submit = move |_| {
        if state.get() != CaptureState::Ready {
            return;
        }
        let card = CardInput {
            number: number.get(),
            month: month.get(),
            year: year.get(),
            cvc: cvc.get(),
            cardholder_name: name.get(),
        };
        set_error.set(None);
        set_state.set(CaptureState::Submitting);
        leptos::task::spawn_local(async move {
            match api::capture_card(mode, &card).await {
                Ok(outcome) => handle_outcome(outcome),
                Err(e) => {
                    set_error.set(Some(e));
                    set_state.set(CaptureState::Ready);
                }
            }
        });
    };

    let verify = move |_| {
        let CaptureState::AwaitingVerification { intent_id } = state.get() else {
            return;
        };
        set_error.set(None);
        set_state.set(CaptureState::Verifying);
        leptos::task::spawn_local(async move {
            match api::confirm_verification().await {
                Ok(outcome) => handle_outcome(outcome),
                Err(e) => {
                    set_error.set(Some(e));
                    set_state.set(CaptureState::AwaitingVerification { intent_id });
                }
            }
        });
    };

    view! {
        <section class="card-capture">
            {move || match state.get() {
                CaptureState::Loading => view! { <p class="loading">"Loading payment form..."</p> }.into_any(),
                CaptureState::LoadFailed(e) => view! {
                    <div class="error">
                        <p>{e}</p>
                        <button class="btn" on:click=move |_| load()>"Retry"</button>
                    </div>
                }.into_any(),
                CaptureState::AwaitingVerification { intent_id } => view! {
                    <div class="verification">
                        <p>"Please verify intent " <code>{intent_id}</code> " to continue."</p>
                        <button class="btn btn-primary" on:click=verify>"Verify"</button>
                    </div>
                }.into_any(),
                CaptureState::Verifying => view! { <p class="loading">"Verifying..."</p> }.into_any(),
                CaptureState::Ready | CaptureState::Submitting => view! {
                    <form class="card-form" on:submit=move |ev| { ev.prevent_default(); submit(()); }>
                        <Field label="Cardholder name" placeholder="Jane Doe" value=name />
                        <Field label="Card number" placeholder="4242 4242 4242 4242" value=number />
                        <div class="row">
                            <Field label="Month" placeholder="MM" value=month />
                            <Field label="Year" placeholder="YYYY" value=year />
                            <Field label="CVC" placeholder="123" value=cvc />
                        </div>
                        <button
                            type="submit"
                            class="btn btn-primary"
                            disabled=move || state.get() == CaptureState::Submitting
                        >
                            {move || if state.get() == CaptureState::Submitting { "Processing..." } else { "Submit" }}
                        </button>
                    </form>
                }.into_any(),
            }}

            <Show when=move || error.get().is_some()>
                <p class="error">{move || error.get().unwrap_or_default()}</p>
            </Show>

            {move || session.get().map(|info| view! {
                <p class="meta">
                    {format!("{} • project {}", info.environment, info.project_id.unwrap_or_else(|| "-".into()))}
                </p>
            })}
        </section>
    }
}

/// Saved payment methods for a signed-in user
///
/// Signing in only stores the bearer token; the server checks it on every
/// call. Picking a method in agentic mode may still need verification.
#[component]
pub fn SavedMethods(mode: &'static str) -> impl IntoView {
    let token = RwSignal::new(String::new());
    let (signed_in, set_signed_in) = signal(api::signed_in());
    let (methods, set_methods) = signal(Vec::<SavedMethod>::new());
    let (pending, set_pending) = signal(None::<String>);
    let (busy, set_busy) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let number = RwSignal::new(String::new());
    let month = RwSignal::new(String::new());
    let year = RwSignal::new(String::new());
    let cvc = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());

    let refresh = move || {
        set_error.set(None);
        leptos::task::spawn_local(async move {
            match api::saved_methods().await {
                Ok(list) => set_methods.set(list),
                Err(e) => set_error.set(Some(e)),
            }
        });
    };
    if signed_in.get_untracked() {
        refresh();
    }

    let sign_in = move |_| {
        api::sign_in(&token.get());
        set_signed_in.set(api::signed_in());
        if api::signed_in() {
            refresh();
        } else {
            set_methods.set(Vec::new());
        }
    };

    let sign_out = move |_| {
        api::sign_in("");
        token.set(String::new());
        set_signed_in.set(false);
        set_methods.set(Vec::new());
    };

    let handle_outcome = move |outcome: CaptureOutcome| match outcome {
        CaptureOutcome::Completed { redirect, .. } => api::navigate(&redirect),
        CaptureOutcome::VerificationRequired { intent_id, .. } => set_pending.set(Some(intent_id)),
    };

    let select = move |id: String| {
        set_error.set(None);
        set_busy.set(true);
        leptos::task::spawn_local(async move {
            match api::select_method(&id, mode).await {
                Ok(outcome) => handle_outcome(outcome),
                Err(e) => set_error.set(Some(e)),
            }
            set_busy.set(false);
        });
    };

    let verify = move |_| {
        set_error.set(None);
        set_busy.set(true);
        leptos::task::spawn_local(async move {
            match api::confirm_verification().await {
                Ok(outcome) => handle_outcome(outcome),
                Err(e) => set_error.set(Some(e)),
            }
            set_busy.set(false);
        });
    };

    let save = move |_| {
        let card = CardInput {
            number: number.get(),
            month: month.get(),
            year: year.get(),
            cvc: cvc.get(),
            cardholder_name: name.get(),
        };
        set_error.set(None);
        set_busy.set(true);
        leptos::task::spawn_local(async move {
            match api::save_method(&card).await {
                Ok(saved) => set_methods.update(|list| list.push(saved)),
                Err(e) => set_error.set(Some(e)),
            }
            set_busy.set(false);
        });
    };

    view! {
        <section class="saved-methods">
            <h2>"Saved payment methods"</h2>
            {move || if signed_in.get() {
                view! {
                    <div>
                        <ul class="method-list">
                            <For
                                each=move || methods.get()
                                key=|method| method.id.clone()
                                children=move |method| {
                                    let id = method.id.clone();
                                    view! {
                                        <li>
                                            <span>{method.label()}</span>
                                            <button
                                                class="btn"
                                                disabled=move || busy.get()
                                                on:click=move |_| select(id.clone())
                                            >
                                                "Use"
                                            </button>
                                        </li>
                                    }
                                }
                            />
                        </ul>
                        <Show when=move || methods.get().is_empty()>
                            <p class="meta">"No saved payment methods yet."</p>
                        </Show>

                        <form class="card-form" on:submit=move |ev| { ev.prevent_default(); save(()); }>
                            <Field label="Cardholder name" placeholder="Jane Doe" value=name />
                            <Field label="Card number" placeholder="4242 4242 4242 4242" value=number />
                            <div class="row">
                                <Field label="Month" placeholder="MM" value=month />
                                <Field label="Year" placeholder="YYYY" value=year />
                                <Field label="CVC" placeholder="123" value=cvc />
                            </div>
                            <button type="submit" class="btn" disabled=move || busy.get()>"Save card"</button>
                        </form>

                        <button class="btn btn-link" on:click=sign_out>"Sign out"</button>
                    </div>
                }.into_any()
            } else {
                view! {
                    <form class="sign-in" on:submit=move |ev| { ev.prevent_default(); sign_in(()); }>
                        <Field label="Access token" kind="password" value=token />
                        <button type="submit" class="btn">"Sign in"</button>
                    </form>
                }.into_any()
            }}

            {move || pending.get().map(|intent_id| view! {
                <div class="verification">
                    <p>"Please verify intent " <code>{intent_id}</code> " to continue."</p>
                    <button class="btn btn-primary" disabled=move || busy.get() on:click=verify>"Verify"</button>
                </div>
            })}

            <Show when=move || error.get().is_some()>
                <p class="error">{move || error.get().unwrap_or_default()}</p>
            </Show>
        </section>
    }
}
