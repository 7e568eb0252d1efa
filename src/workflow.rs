//! The claim workflow controller.
//!
//! One controller lives for one page session. It owns the in-progress form
//! values and the phase the page animates on, and talks to the record store,
//! the chat relay and analytics through the traits in [`crate::store`],
//! [`crate::notify`] and [`crate::analytics`].
//!
//! All methods take `&self` so the page can share the controller through an
//! `Rc` and drive it from `spawn_local` tasks. State lives in a `RefCell`
//! that is never borrowed across an `.await`; a second `confirm_handle` or
//! `submit` issued while a step is in flight is refused with
//! [`ClaimError::Busy`] before any remote call.
//!
//! The availability check and the final write are not atomic: two sessions
//! can pass the handle check (or the capacity check) concurrently and both
//! write. The record store has no transactional API to close that gap.

use std::cell::RefCell;

use log::{debug, info, warn};

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::error::{ClaimError, StoreError};
use crate::notify::{ClaimNotice, Notifier};
use crate::store::{Field, FieldFilter, RecordStore};
use crate::validation::{validate_details, validate_handle};
use crate::{Claim, ClaimReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Entering the handle.
    #[default]
    Idle,
    /// Availability check for the handle is in flight.
    Validating,
    /// Entering name and email.
    ExtendedForm,
    /// Claim checks and record write are in flight.
    Submitting,
    Complete,
}

/// Everything the page renders from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowSnapshot {
    pub phase: Phase,
    pub handle: String,
    pub full_name: String,
    pub email: String,
    /// Error overlay for `Idle` or `ExtendedForm`.
    pub error: Option<ClaimError>,
    /// `None` until the first slot count has been read.
    pub remaining_slots: Option<u64>,
    pub receipt: Option<ClaimReceipt>,
}

impl WorkflowSnapshot {
    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Validating | Phase::Submitting)
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Result of the debounced availability preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Nothing typed yet.
    Empty,
    Invalid,
    Available,
    Taken,
    /// The read failed or the input changed while it was in flight.
    Unknown,
}

type Listener = Box<dyn Fn(&WorkflowSnapshot)>;

pub struct ClaimWorkflow<S, N, A> {
    store: S,
    notifier: N,
    analytics: A,
    capacity: u64,
    state: RefCell<WorkflowSnapshot>,
    listener: RefCell<Option<Listener>>,
}

impl<S, N, A> ClaimWorkflow<S, N, A>
where
    S: RecordStore,
    N: Notifier,
    A: Analytics,
{
    pub fn new(store: S, notifier: N, analytics: A, capacity: u64) -> Self {
        Self {
            store,
            notifier,
            analytics,
            capacity,
            state: RefCell::new(WorkflowSnapshot::default()),
            listener: RefCell::new(None),
        }
    }

    /// Register the callback invoked after every state change.
    pub fn set_listener(&self, listener: impl Fn(&WorkflowSnapshot) + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.borrow().clone()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Replace the handle being typed. Ignored once the handle step is done.
    pub fn set_handle(&self, handle: &str) {
        self.update(|s| {
            if s.phase == Phase::Idle && s.handle != handle {
                s.handle = handle.to_string();
                s.error = None;
            }
        });
    }

    pub fn set_full_name(&self, full_name: &str) {
        self.update(|s| {
            s.full_name = full_name.to_string();
            if s.phase == Phase::ExtendedForm {
                s.error = None;
            }
        });
    }

    pub fn set_email(&self, email: &str) {
        self.update(|s| {
            s.email = email.to_string();
            if s.phase == Phase::ExtendedForm {
                s.error = None;
            }
        });
    }

    /// Leave the extended form and edit the handle again.
    pub fn back_to_handle(&self) {
        self.update(|s| {
            if s.phase == Phase::ExtendedForm {
                s.phase = Phase::Idle;
                s.error = None;
            }
        });
    }

    /// Debounced check while the user types: never changes the phase.
    pub async fn preview_handle(&self) -> Availability {
        let handle = {
            let s = self.state.borrow();
            if s.phase != Phase::Idle {
                return Availability::Unknown;
            }
            s.handle.clone()
        };
        if handle.is_empty() {
            self.update(|s| s.error = None);
            return Availability::Empty;
        }
        if let Err(issue) = validate_handle(&handle) {
            self.update(|s| s.error = Some(issue.into()));
            return Availability::Invalid;
        }

        let result = self.handle_count(&handle).await;
        let available = result.as_ref().ok().map(|count| *count == 0);
        self.analytics.capture(&AnalyticsEvent::HandleAvailabilityCheck {
            handle: handle.clone(),
            available,
        });

        // The user may have kept typing while the read was in flight.
        let current = {
            let s = self.state.borrow();
            s.phase == Phase::Idle && s.handle == handle
        };
        if !current {
            return Availability::Unknown;
        }
        match available {
            Some(true) => {
                self.update(|s| s.error = None);
                Availability::Available
            }
            Some(false) => {
                self.update(|s| s.error = Some(ClaimError::HandleTaken));
                Availability::Taken
            }
            None => Availability::Unknown,
        }
    }

    /// `Idle → Validating → ExtendedForm`.
    pub async fn confirm_handle(&self) -> Result<(), ClaimError> {
        let handle = {
            let s = self.state.borrow();
            if s.phase != Phase::Idle {
                return Err(ClaimError::Busy);
            }
            s.handle.clone()
        };
        if let Err(issue) = validate_handle(&handle) {
            self.analytics.capture(&AnalyticsEvent::HandleValidationError {
                handle,
                reason: issue.to_string(),
            });
            return Err(self.fail(Phase::Idle, issue.into()));
        }

        self.update(|s| {
            s.phase = Phase::Validating;
            s.error = None;
        });

        match self.handle_count(&handle).await {
            Err(e) => {
                warn!("availability check for {} failed: {}", handle, e);
                self.analytics.capture(&AnalyticsEvent::HandleAvailabilityCheck {
                    handle,
                    available: None,
                });
                Err(self.fail(Phase::Idle, ClaimError::AvailabilityCheckFailed))
            }
            Ok(count) if count > 0 => {
                self.analytics.capture(&AnalyticsEvent::HandleAvailabilityCheck {
                    handle,
                    available: Some(false),
                });
                Err(self.fail(Phase::Idle, ClaimError::HandleTaken))
            }
            Ok(_) => {
                self.analytics.capture(&AnalyticsEvent::HandleAvailabilityCheck {
                    handle: handle.clone(),
                    available: Some(true),
                });
                self.analytics
                    .capture(&AnalyticsEvent::HandleValidated { handle: handle.clone() });
                info!("handle {} is available", handle);
                self.update(|s| {
                    s.phase = Phase::ExtendedForm;
                    s.error = None;
                });
                Ok(())
            }
        }
    }

    /// `ExtendedForm → Submitting → Complete`.
    pub async fn submit(&self) -> Result<ClaimReceipt, ClaimError> {
        let (handle, full_name, email) = {
            let s = self.state.borrow();
            if s.phase != Phase::ExtendedForm {
                return Err(ClaimError::Busy);
            }
            (s.handle.clone(), s.full_name.clone(), s.email.clone())
        };
        if let Err(issue) = validate_details(&full_name, &email) {
            self.analytics.capture(&AnalyticsEvent::FormSubmissionError {
                handle,
                reason: issue.to_string(),
            });
            return Err(self.fail(Phase::ExtendedForm, issue.into()));
        }

        self.update(|s| {
            s.phase = Phase::Submitting;
            s.error = None;
        });

        let claim = match self.write_claim(handle.clone(), full_name, email).await {
            Ok(claim) => claim,
            Err(err) => {
                self.analytics.capture(&AnalyticsEvent::FormSubmissionError {
                    handle,
                    reason: err.code().to_string(),
                });
                if err == ClaimError::CapacityExceeded {
                    self.update(|s| s.remaining_slots = Some(0));
                }
                return Err(self.fail(Phase::ExtendedForm, err));
            }
        };

        let notice = ClaimNotice::for_claim(&claim, self.capacity);
        if let Err(e) = self.notifier.notify(&notice).await {
            warn!("claim notification for {} not delivered: {}", claim.handle, e);
        }
        self.analytics.capture(&AnalyticsEvent::HandleClaimed {
            handle: claim.handle.clone(),
            position: claim.position,
        });
        info!("claimed {} at position {}", claim.handle, claim.position);

        let receipt = ClaimReceipt::from(&claim);
        let capacity = self.capacity;
        self.update(|s| {
            s.phase = Phase::Complete;
            s.error = None;
            s.remaining_slots = Some(match s.remaining_slots {
                Some(r) => r.saturating_sub(1),
                None => capacity.saturating_sub(claim.position),
            });
            s.receipt = Some(receipt.clone());
        });
        Ok(receipt)
    }

    /// Re-read the total record count and update the remaining-slots counter.
    pub async fn refresh_slots(&self) -> Result<u64, StoreError> {
        let total = self.store.count(None).await.map_err(|e| {
            warn!("slot refresh failed: {}", e);
            e
        })?;
        let remaining = self.capacity.saturating_sub(total);
        debug!("{} of {} slots remaining", remaining, self.capacity);
        self.update(|s| s.remaining_slots = Some(remaining));
        Ok(remaining)
    }

    async fn handle_count(&self, handle: &str) -> Result<u64, StoreError> {
        self.store
            .count(Some(&FieldFilter::eq(Field::Handle, handle)))
            .await
    }

    /// Email uniqueness, capacity, then the record write. Strictly sequential.
    async fn write_claim(
        &self,
        handle: String,
        full_name: String,
        email: String,
    ) -> Result<Claim, ClaimError> {
        let used = self
            .store
            .count(Some(&FieldFilter::eq(Field::Email, email.as_str())))
            .await
            .map_err(|e| submission_failed("email check", e))?;
        if used > 0 {
            return Err(ClaimError::EmailAlreadyUsed);
        }

        let total = self
            .store
            .count(None)
            .await
            .map_err(|e| submission_failed("capacity check", e))?;
        if total >= self.capacity {
            return Err(ClaimError::CapacityExceeded);
        }

        let claim = Claim {
            handle,
            full_name,
            email,
            position: total + 1,
        };
        self.store
            .create(&claim)
            .await
            .map_err(|e| submission_failed("record write", e))?;
        Ok(claim)
    }

    fn fail(&self, phase: Phase, err: ClaimError) -> ClaimError {
        debug!("claim step failed: {}", err.code());
        self.update(|s| {
            s.phase = phase;
            s.error = Some(err.clone());
        });
        err
    }

    fn update(&self, f: impl FnOnce(&mut WorkflowSnapshot)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            let before = state.clone();
            f(&mut state);
            if *state == before {
                return;
            }
            state.clone()
        };
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(&snapshot);
        }
    }
}

fn submission_failed(step: &str, e: StoreError) -> ClaimError {
    warn!("{} failed: {}", step, e);
    ClaimError::SubmissionFailed
}
