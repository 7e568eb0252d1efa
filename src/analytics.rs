//! Product analytics capture for each step of the claim form.
//!
//! Capture is fire-and-forget: implementations must never fail the caller.

use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = posthog, js_name = capture)]
    fn posthog_capture(event: &str, properties: JsValue) -> Result<(), JsValue>;
}

/// Events emitted by the claim workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    HandleValidationError { handle: String, reason: String },
    HandleAvailabilityCheck { handle: String, available: Option<bool> },
    HandleValidated { handle: String },
    HandleClaimed { handle: String, position: u64 },
    FormSubmissionError { handle: String, reason: String },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::HandleValidationError { .. } => "handle_validation_error",
            AnalyticsEvent::HandleAvailabilityCheck { .. } => "handle_availability_check",
            AnalyticsEvent::HandleValidated { .. } => "handle_validated",
            AnalyticsEvent::HandleClaimed { .. } => "handle_claimed",
            AnalyticsEvent::FormSubmissionError { .. } => "form_submission_error",
        }
    }

    pub fn properties(&self) -> Value {
        match self {
            AnalyticsEvent::HandleValidationError { handle, reason }
            | AnalyticsEvent::FormSubmissionError { handle, reason } => {
                json!({ "handle": handle, "reason": reason })
            }
            AnalyticsEvent::HandleAvailabilityCheck { handle, available } => {
                json!({ "handle": handle, "available": available })
            }
            AnalyticsEvent::HandleValidated { handle } => json!({ "handle": handle }),
            AnalyticsEvent::HandleClaimed { handle, position } => {
                json!({ "handle": handle, "position": position })
            }
        }
    }
}

pub trait Analytics {
    fn capture(&self, event: &AnalyticsEvent);
}

/// Forwards events to the page's global `posthog` object.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosthogAnalytics;

impl Analytics for PosthogAnalytics {
    fn capture(&self, event: &AnalyticsEvent) {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let properties = match event.properties().serialize(&serializer) {
            Ok(props) => props,
            Err(e) => {
                log::warn!("analytics properties for {} not serializable: {}", event.name(), e);
                return;
            }
        };
        if let Err(e) = posthog_capture(event.name(), properties) {
            log::warn!("analytics capture {} failed: {:?}", event.name(), e);
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn capture(&self, _event: &AnalyticsEvent) {}
}
