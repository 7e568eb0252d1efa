//! Pure Yew view components for the claim page.
//!
//! These render from props only; the workflow and timers live in `main.rs`.

use operator_claim::config::MIN_HANDLE_LEN;
use operator_claim::share::share_url;
use yew::prelude::*;

fn render_error(error: &Option<AttrValue>) -> Html {
    match error {
        Some(msg) => html! { <p class="form-error" role="alert">{ msg.clone() }</p> },
        None => html! {},
    }
}

/// First step: the handle input and its Claim button.
#[derive(Properties, PartialEq)]
pub struct HandleStepProps {
    pub handle: AttrValue,
    pub error: Option<AttrValue>,
    pub busy: bool,
    pub oninput: Callback<InputEvent>,
}

#[function_component(HandleStep)]
pub fn handle_step(props: &HandleStepProps) -> Html {
    let long_enough = props.handle.chars().count() >= MIN_HANDLE_LEN;
    html! {
        <div class="handle-step">
            <div class="input-with-action">
                <input type="text"
                    class="handle-input"
                    placeholder="Claim your name (min. 3 char)"
                    value={props.handle.clone()}
                    oninput={props.oninput.clone()}
                    autocomplete="off"
                    autofocus=true
                />
                <button type="submit" class="claim-button" disabled={!long_enough || props.busy}>
                    { if props.busy { "Checking..." } else { "Claim" } }
                </button>
            </div>
            { render_error(&props.error) }
        </div>
    }
}

/// Second step: full name and email for the chosen handle.
#[derive(Properties, PartialEq)]
pub struct DetailsStepProps {
    pub handle: AttrValue,
    pub full_name: AttrValue,
    pub email: AttrValue,
    pub error: Option<AttrValue>,
    pub submitting: bool,
    pub on_name_input: Callback<InputEvent>,
    pub on_email_input: Callback<InputEvent>,
    pub on_back: Callback<MouseEvent>,
}

#[function_component(DetailsStep)]
pub fn details_step(props: &DetailsStepProps) -> Html {
    let complete = !props.full_name.trim().is_empty() && props.email.contains('@');
    html! {
        <div class="details-step">
            <div class="handle-chip">
                <span class="handle-chip-name">{ props.handle.clone() }</span>
                <button type="button" class="link-button" onclick={props.on_back.clone()}
                    disabled={props.submitting}>
                    { "change" }
                </button>
            </div>
            <input type="text"
                class="details-input"
                placeholder="Full Name"
                value={props.full_name.clone()}
                oninput={props.on_name_input.clone()}
                autocomplete="name"
                autofocus=true
            />
            <div class="input-with-action">
                <input type="email"
                    class="details-input"
                    placeholder="Email"
                    value={props.email.clone()}
                    oninput={props.on_email_input.clone()}
                    autocomplete="email"
                />
                <button type="submit" class="complete-button" disabled={!complete || props.submitting}>
                    { if props.submitting { "Submitting..." } else { "Complete" } }
                </button>
            </div>
            { render_error(&props.error) }
        </div>
    }
}

/// Thank-you card with the share link.
#[derive(Properties, PartialEq)]
pub struct CompletionCardProps {
    pub handle: AttrValue,
    pub email: AttrValue,
    pub on_share_hover: Callback<bool>,
}

#[function_component(CompletionCard)]
pub fn completion_card(props: &CompletionCardProps) -> Html {
    let onmouseenter = props.on_share_hover.reform(|_: MouseEvent| true);
    let onmouseleave = props.on_share_hover.reform(|_: MouseEvent| false);
    html! {
        <div class="completion-card">
            <h3>{ format!("Thank you, {}!", props.handle) }</h3>
            <p>
                { "Your operator handle has been reserved. Want to secure your spot? \
                   Share about Pointer on Twitter and we'll make sure you're included!" }
            </p>
            <a class="share-button"
                href={share_url(&props.handle)}
                target="_blank"
                rel="noopener noreferrer"
                {onmouseenter}
                {onmouseleave}
            >
                { "Share on Twitter" }
            </a>
            <p class="completion-note">
                { format!("We'll email you at {} with next steps", props.email) }
            </p>
        </div>
    }
}

/// Remaining-slots counter under the form.
#[derive(Properties, PartialEq)]
pub struct SlotsBadgeProps {
    pub remaining: Option<u64>,
    pub capacity: u64,
}

#[function_component(SlotsBadge)]
pub fn slots_badge(props: &SlotsBadgeProps) -> Html {
    let text = match props.remaining {
        Some(0) => "All spots have been claimed".to_string(),
        Some(n) => format!("{} of {} spots left", n, props.capacity),
        None => format!("Only {} spots available", props.capacity),
    };
    html! { <p class="slots-badge">{ text }</p> }
}
