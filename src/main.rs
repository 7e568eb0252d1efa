//! Main module for the operator claim page using Yew.
//! Wires the claim workflow, timers and the speech bubble into the view.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use log::debug;
use operator_claim::{
    analytics::PosthogAnalytics,
    cache::SystemClock,
    config::{ClaimConfig, DEBOUNCE_MS, MOBILE_BREAKPOINT_PX, SLOTS_REFRESH_MS},
    notify::RelayNotifier,
    speech::{claim_script, SpeechFrame, SpeechPlayer, Step},
    store::NocoDbStore,
    ClaimWorkflow, Phase,
};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

mod components;
mod hooks;

use components::{CompletionCard, DetailsStep, HandleStep, SlotsBadge};
use hooks::{use_debounced, use_interval_task};

type SiteWorkflow = ClaimWorkflow<NocoDbStore, RelayNotifier, PosthogAnalytics>;

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

fn build_workflow() -> SiteWorkflow {
    let origin = gloo_utils::window().location().origin().unwrap_or_default();
    let config = ClaimConfig::from_build_env().with_origin(&origin);
    ClaimWorkflow::new(
        NocoDbStore::new(&config, SystemClock),
        RelayNotifier::new(config.relay_url.clone()),
        PosthogAnalytics,
        config.capacity,
    )
}

fn input_value(e: &InputEvent) -> String {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.value()
}

fn is_mobile() -> bool {
    gloo_utils::window()
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .map(|w| w < MOBILE_BREAKPOINT_PX)
        .unwrap_or(false)
}

fn phase_class(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "phase-idle",
        Phase::Validating => "phase-validating",
        Phase::ExtendedForm => "phase-extended",
        Phase::Submitting => "phase-submitting",
        Phase::Complete => "phase-complete",
    }
}

/// Step the speech player on its own schedule until it waits.
///
/// Bumping `token` stops a previously started run at its next wake-up.
fn drive_speech(
    player: Rc<RefCell<SpeechPlayer>>,
    token: Rc<Cell<u32>>,
    frame: UseStateHandle<SpeechFrame>,
    first: Step,
) {
    let current = token.get().wrapping_add(1);
    token.set(current);
    spawn_local(async move {
        let mut step = first;
        while let Step::After(ms) = step {
            TimeoutFuture::new(ms).await;
            if token.get() != current {
                return;
            }
            step = player.borrow_mut().step();
            frame.set(player.borrow().frame());
        }
    });
}

// ──────────────────────────────────────────────────────────────────────────────

#[derive(Properties, PartialEq)]
struct SpeechBubbleProps {
    handle: AttrValue,
    position: u64,
    share_hovered: bool,
}

/// Typed speech bubble shown after a claim completes.
#[function_component(SpeechBubble)]
fn speech_bubble(props: &SpeechBubbleProps) -> Html {
    let player = use_mut_ref(|| SpeechPlayer::new(claim_script(), &props.handle, props.position));
    let run_token = use_memo((), |_| Cell::new(0u32));
    let frame = use_state(|| player.borrow().frame());

    // Start on mount; stop on unmount
    {
        let player = player.clone();
        let run_token = run_token.clone();
        let frame = frame.clone();
        use_effect_with((), move |_| {
            let first = player.borrow().start();
            drive_speech(player, run_token.clone(), frame, first);
            move || run_token.set(run_token.get().wrapping_add(1))
        });
    }

    // Share-button hover shows or hides the final line
    {
        let player = player.clone();
        let run_token = run_token.clone();
        let frame = frame.clone();
        use_effect_with(props.share_hovered, move |&hovered| {
            let change = player.borrow_mut().set_hovered(hovered);
            if let Some(step) = change {
                frame.set(player.borrow().frame());
                drive_speech(player, run_token, frame, step);
            }
            || ()
        });
    }

    if !frame.visible {
        return html! {};
    }
    let layout = if is_mobile() { "speech-bubble mobile" } else { "speech-bubble" };
    html! {
        <div class={classes!(layout, frame.animation.css_class())}>
            { frame.text.clone() }
            if frame.typing {
                <span class="typing-caret" />
            }
        </div>
    }
}

/// Primary application component wiring the workflow into the form.
#[function_component(Main)]
fn main_component() -> Html {
    let workflow = use_memo((), |_| build_workflow());
    let snapshot = use_state(|| workflow.snapshot());
    let share_hovered = use_state(|| false);

    // Re-render on every workflow change
    {
        let workflow = workflow.clone();
        let snapshot = snapshot.clone();
        use_effect_with((), move |_| {
            workflow.set_listener(move |s| snapshot.set(s.clone()));
            || ()
        });
    }

    // Slots counter: initial read, then on a fixed interval
    {
        let workflow = workflow.clone();
        use_interval_task(SLOTS_REFRESH_MS, move || {
            let workflow = workflow.clone();
            spawn_local(async move {
                let _ = workflow.refresh_slots().await;
            });
        });
    }

    let preview = {
        let workflow = workflow.clone();
        Callback::from(move |_: ()| {
            let workflow = workflow.clone();
            spawn_local(async move {
                let availability = workflow.preview_handle().await;
                debug!("handle preview: {:?}", availability);
            });
        })
    };
    let debounced_preview = use_debounced(DEBOUNCE_MS, preview);

    let on_handle_input = {
        let workflow = workflow.clone();
        Callback::from(move |e: InputEvent| {
            workflow.set_handle(&input_value(&e));
            debounced_preview.emit(());
        })
    };
    let on_name_input = {
        let workflow = workflow.clone();
        Callback::from(move |e: InputEvent| workflow.set_full_name(&input_value(&e)))
    };
    let on_email_input = {
        let workflow = workflow.clone();
        Callback::from(move |e: InputEvent| workflow.set_email(&input_value(&e)))
    };
    let on_back = {
        let workflow = workflow.clone();
        Callback::from(move |_: MouseEvent| workflow.back_to_handle())
    };

    let onsubmit = {
        let workflow = workflow.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let workflow = workflow.clone();
            spawn_local(async move {
                let outcome = match workflow.snapshot().phase {
                    Phase::Idle => workflow.confirm_handle().await.map(|_| ()),
                    Phase::ExtendedForm => workflow.submit().await.map(|_| ()),
                    // the buttons are disabled while a step is in flight
                    _ => Ok(()),
                };
                if let Err(err) = outcome {
                    debug!("claim step rejected: {}", err.code());
                }
            });
        })
    };

    let on_share_hover = {
        let share_hovered = share_hovered.clone();
        Callback::from(move |hovered: bool| share_hovered.set(hovered))
    };

    let s = &*snapshot;
    let error = s.error_message().map(AttrValue::from);

    let body = match (s.phase, &s.receipt) {
        (Phase::Complete, Some(receipt)) => html! {
            <>
                <CompletionCard
                    handle={AttrValue::from(receipt.handle.clone())}
                    email={AttrValue::from(s.email.clone())}
                    on_share_hover={on_share_hover}
                />
                <SpeechBubble
                    handle={AttrValue::from(receipt.handle.clone())}
                    position={receipt.position}
                    share_hovered={*share_hovered}
                />
            </>
        },
        (Phase::Idle | Phase::Validating, _) => html! {
            <form class={classes!("claim-form", phase_class(s.phase))} {onsubmit}>
                <HandleStep
                    handle={AttrValue::from(s.handle.clone())}
                    error={error}
                    busy={s.is_busy()}
                    oninput={on_handle_input}
                />
                <SlotsBadge remaining={s.remaining_slots} capacity={workflow.capacity()} />
            </form>
        },
        _ => html! {
            <form class={classes!("claim-form", phase_class(s.phase))} {onsubmit}>
                <DetailsStep
                    handle={AttrValue::from(s.handle.clone())}
                    full_name={AttrValue::from(s.full_name.clone())}
                    email={AttrValue::from(s.email.clone())}
                    error={error}
                    submitting={s.is_submitting()}
                    on_name_input={on_name_input}
                    on_email_input={on_email_input}
                    on_back={on_back}
                />
                <SlotsBadge remaining={s.remaining_slots} capacity={workflow.capacity()} />
            </form>
        },
    };

    html! {
        <div class="page">
            <header class="hero">
                <h1>{ "Pointer" }</h1>
                <p class="tagline">{ "The Generalist Browser Agent for Everyone" }</p>
            </header>
            <main class="claim-area">
                if s.phase == Phase::Idle || s.phase == Phase::Validating {
                    <p class="claim-intro">{ "Claim your personal operator" }</p>
                }
                { body }
            </main>
        </div>
    }
}

/// Entry point: installs the panic hook and renders the page.
fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<Main>::new().render();
}
