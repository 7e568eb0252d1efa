//! Claim workflow scenarios against in-memory collaborators.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::executor::block_on;
use operator_claim::analytics::{Analytics, AnalyticsEvent};
use operator_claim::notify::{ClaimNotice, Notifier};
use operator_claim::store::{Field, FieldFilter, RecordStore};
use operator_claim::workflow::Availability;
use operator_claim::{Claim, ClaimError, ClaimWorkflow, FormatIssue, Phase, StoreError};

/// Completes on the second poll, giving a concurrent future a turn.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Default)]
struct StoreState {
    handles: HashMap<String, u64>,
    emails: HashMap<String, u64>,
    total: u64,
    fail_reads: bool,
    fail_writes: bool,
    calls: Vec<String>,
    created: Vec<Claim>,
}

#[derive(Clone, Default)]
struct FakeStore(Rc<RefCell<StoreState>>);

impl FakeStore {
    fn with_total(total: u64) -> Self {
        let store = Self::default();
        store.0.borrow_mut().total = total;
        store
    }

    fn taken_handle(self, handle: &str) -> Self {
        self.0.borrow_mut().handles.insert(handle.to_string(), 1);
        self
    }

    fn used_email(self, email: &str) -> Self {
        self.0.borrow_mut().emails.insert(email.to_string(), 1);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.0.borrow().calls.clone()
    }

    fn created(&self) -> Vec<Claim> {
        self.0.borrow().created.clone()
    }
}

fn transport_error() -> StoreError {
    StoreError::Status {
        status: 503,
        url: "https://db.test/records/count".to_string(),
    }
}

impl RecordStore for FakeStore {
    async fn count(&self, filter: Option<&FieldFilter>) -> Result<u64, StoreError> {
        let call = match filter {
            Some(f) => format!("count {}", f.to_where_clause()),
            None => "count".to_string(),
        };
        self.0.borrow_mut().calls.push(call);
        YieldOnce(false).await;

        let state = self.0.borrow();
        if state.fail_reads {
            return Err(transport_error());
        }
        Ok(match filter {
            Some(FieldFilter { field: Field::Handle, value }) => {
                state.handles.get(value).copied().unwrap_or(0)
            }
            Some(FieldFilter { field: Field::Email, value }) => {
                state.emails.get(value).copied().unwrap_or(0)
            }
            None => state.total,
        })
    }

    async fn create(&self, claim: &Claim) -> Result<(), StoreError> {
        let mut state = self.0.borrow_mut();
        state.calls.push(format!("create {}", claim.handle));
        if state.fail_writes {
            return Err(transport_error());
        }
        state.total += 1;
        state.created.push(claim.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeNotifier {
    fail: bool,
    sent: Rc<RefCell<Vec<ClaimNotice>>>,
}

impl Notifier for FakeNotifier {
    async fn notify(&self, notice: &ClaimNotice) -> Result<(), StoreError> {
        if self.fail {
            return Err(transport_error());
        }
        self.sent.borrow_mut().push(notice.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingAnalytics(Rc<RefCell<Vec<AnalyticsEvent>>>);

impl RecordingAnalytics {
    fn names(&self) -> Vec<&'static str> {
        self.0.borrow().iter().map(|e| e.name()).collect()
    }
}

impl Analytics for RecordingAnalytics {
    fn capture(&self, event: &AnalyticsEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}

type TestWorkflow = ClaimWorkflow<FakeStore, FakeNotifier, RecordingAnalytics>;

struct Harness {
    workflow: TestWorkflow,
    store: FakeStore,
    notifier: FakeNotifier,
    analytics: RecordingAnalytics,
}

fn harness(store: FakeStore, notifier: FakeNotifier) -> Harness {
    let analytics = RecordingAnalytics::default();
    let workflow = ClaimWorkflow::new(store.clone(), notifier.clone(), analytics.clone(), 300);
    Harness {
        workflow,
        store,
        notifier,
        analytics,
    }
}

/// Walk a fresh workflow to the extended form with valid details filled in.
fn at_extended_form(h: &Harness, handle: &str, email: &str) {
    h.workflow.set_handle(handle);
    block_on(h.workflow.confirm_handle()).expect("handle should be available");
    h.workflow.set_full_name("Ada Lovelace");
    h.workflow.set_email(email);
    h.store.0.borrow_mut().calls.clear();
}

#[test]
fn malformed_handles_are_rejected_without_network() {
    for (handle, issue) in [
        ("ab", FormatIssue::TooShort),
        ("", FormatIssue::TooShort),
        ("bad handle", FormatIssue::InvalidCharacters),
        ("dots.not.allowed", FormatIssue::InvalidCharacters),
    ] {
        let h = harness(FakeStore::default(), FakeNotifier::default());
        h.workflow.set_handle(handle);
        let err = block_on(h.workflow.confirm_handle()).unwrap_err();
        assert_eq!(err, ClaimError::InvalidFormat(issue), "{handle:?}");
        assert_eq!(h.workflow.snapshot().phase, Phase::Idle);
        assert!(h.store.calls().is_empty());
    }
}

#[test]
fn available_handle_moves_to_extended_form() {
    let h = harness(FakeStore::default(), FakeNotifier::default());
    h.workflow.set_handle("validhandle");
    block_on(h.workflow.confirm_handle()).unwrap();

    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::ExtendedForm);
    assert_eq!(snap.error, None);
    assert_eq!(h.store.calls(), vec!["count (Handle,eq,validhandle)"]);
    assert_eq!(
        h.analytics.names(),
        vec!["handle_availability_check", "handle_validated"]
    );
}

#[test]
fn taken_handle_stays_idle() {
    let h = harness(FakeStore::default().taken_handle("taken"), FakeNotifier::default());
    h.workflow.set_handle("taken");
    let err = block_on(h.workflow.confirm_handle()).unwrap_err();

    assert_eq!(err, ClaimError::HandleTaken);
    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.error, Some(ClaimError::HandleTaken));
}

#[test]
fn failed_availability_read_is_retryable() {
    let store = FakeStore::default();
    store.0.borrow_mut().fail_reads = true;
    let h = harness(store, FakeNotifier::default());
    h.workflow.set_handle("neo");

    let err = block_on(h.workflow.confirm_handle()).unwrap_err();
    assert_eq!(err, ClaimError::AvailabilityCheckFailed);
    assert_eq!(h.workflow.snapshot().phase, Phase::Idle);

    h.store.0.borrow_mut().fail_reads = false;
    block_on(h.workflow.confirm_handle()).unwrap();
    assert_eq!(h.workflow.snapshot().phase, Phase::ExtendedForm);
}

#[test]
fn successful_claim_completes_with_next_position() {
    let h = harness(FakeStore::with_total(41), FakeNotifier::default());
    at_extended_form(&h, "trinity", "t@example.com");

    let receipt = block_on(h.workflow.submit()).unwrap();
    assert_eq!(receipt.handle, "trinity");
    assert_eq!(receipt.position, 42);

    assert_eq!(
        h.store.calls(),
        vec![
            "count (Email,eq,t@example.com)",
            "count",
            "create trinity",
        ]
    );
    let created = h.store.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].full_name, "Ada Lovelace");
    assert_eq!(created[0].position, 42);

    assert_eq!(h.notifier.sent.borrow().len(), 1);
    assert!(h.analytics.names().contains(&"handle_claimed"));

    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::Complete);
    assert_eq!(snap.receipt, Some(receipt));
    assert_eq!(snap.remaining_slots, Some(258));
}

#[test]
fn email_on_file_blocks_submission() {
    let h = harness(
        FakeStore::default().used_email("dup@example.com"),
        FakeNotifier::default(),
    );
    at_extended_form(&h, "neo", "dup@example.com");

    let err = block_on(h.workflow.submit()).unwrap_err();
    assert_eq!(err, ClaimError::EmailAlreadyUsed);
    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::ExtendedForm);
    assert_eq!(snap.error, Some(ClaimError::EmailAlreadyUsed));
    assert!(h.store.created().is_empty());
    assert_eq!(h.store.calls(), vec!["count (Email,eq,dup@example.com)"]);
}

#[test]
fn full_capacity_blocks_write_and_notification() {
    let h = harness(FakeStore::with_total(300), FakeNotifier::default());
    at_extended_form(&h, "late", "late@example.com");

    let err = block_on(h.workflow.submit()).unwrap_err();
    assert_eq!(err, ClaimError::CapacityExceeded);
    assert!(h.store.created().is_empty());
    assert!(h.notifier.sent.borrow().is_empty());

    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::ExtendedForm);
    assert_eq!(snap.remaining_slots, Some(0));
    assert!(h.analytics.names().contains(&"form_submission_error"));
}

#[test]
fn notification_failure_does_not_block_completion() {
    let notifier = FakeNotifier {
        fail: true,
        ..FakeNotifier::default()
    };
    let h = harness(FakeStore::with_total(9), notifier);
    at_extended_form(&h, "morpheus", "m@example.com");

    let receipt = block_on(h.workflow.submit()).unwrap();
    assert_eq!(receipt.position, 10);
    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::Complete);
    assert_eq!(snap.error, None);
}

#[test]
fn write_failure_returns_to_extended_form() {
    let h = harness(FakeStore::with_total(3), FakeNotifier::default());
    at_extended_form(&h, "switch", "s@example.com");
    h.store.0.borrow_mut().fail_writes = true;

    let err = block_on(h.workflow.submit()).unwrap_err();
    assert_eq!(err, ClaimError::SubmissionFailed);
    assert_eq!(h.workflow.snapshot().phase, Phase::ExtendedForm);
    assert!(h.notifier.sent.borrow().is_empty());

    // retry from the same step
    h.store.0.borrow_mut().fail_writes = false;
    let receipt = block_on(h.workflow.submit()).unwrap();
    assert_eq!(receipt.position, 4);
}

#[test]
fn invalid_details_are_rejected_locally() {
    let h = harness(FakeStore::default(), FakeNotifier::default());
    at_extended_form(&h, "tank", "no-at-sign");

    let err = block_on(h.workflow.submit()).unwrap_err();
    assert_eq!(err, ClaimError::InvalidFormat(FormatIssue::InvalidEmail));
    assert!(h.store.calls().is_empty());

    h.workflow.set_email("tank@example.com");
    h.workflow.set_full_name("   ");
    let err = block_on(h.workflow.submit()).unwrap_err();
    assert_eq!(err, ClaimError::InvalidFormat(FormatIssue::MissingName));
    assert!(h.store.calls().is_empty());
}

#[test]
fn double_submit_issues_one_set_of_remote_calls() {
    let h = harness(FakeStore::with_total(0), FakeNotifier::default());
    at_extended_form(&h, "oracle", "o@example.com");

    let (first, second) = block_on(futures::future::join(
        h.workflow.submit(),
        h.workflow.submit(),
    ));

    assert_eq!(first.unwrap().position, 1);
    assert_eq!(second.unwrap_err(), ClaimError::Busy);
    assert_eq!(h.store.calls().len(), 3);
    assert_eq!(h.store.created().len(), 1);
}

#[test]
fn confirm_while_validating_is_refused() {
    let h = harness(FakeStore::default(), FakeNotifier::default());
    h.workflow.set_handle("cypher");

    let (first, second) = block_on(futures::future::join(
        h.workflow.confirm_handle(),
        h.workflow.confirm_handle(),
    ));
    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), ClaimError::Busy);
    assert_eq!(h.store.calls().len(), 1);
}

#[test]
fn preview_flags_taken_handle_without_changing_phase() {
    let h = harness(FakeStore::default().taken_handle("taken"), FakeNotifier::default());

    h.workflow.set_handle("taken");
    assert_eq!(block_on(h.workflow.preview_handle()), Availability::Taken);
    let snap = h.workflow.snapshot();
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.error, Some(ClaimError::HandleTaken));

    h.workflow.set_handle("free");
    assert_eq!(block_on(h.workflow.preview_handle()), Availability::Available);
    assert_eq!(h.workflow.snapshot().error, None);

    h.workflow.set_handle("x");
    assert_eq!(block_on(h.workflow.preview_handle()), Availability::Invalid);
    assert_eq!(h.store.calls().len(), 2);

    h.workflow.set_handle("");
    assert_eq!(block_on(h.workflow.preview_handle()), Availability::Empty);
    assert_eq!(h.workflow.snapshot().error, None);
}

#[test]
fn refresh_slots_tracks_remaining_capacity() {
    let h = harness(FakeStore::with_total(120), FakeNotifier::default());
    assert_eq!(h.workflow.snapshot().remaining_slots, None);

    assert_eq!(block_on(h.workflow.refresh_slots()).unwrap(), 180);
    assert_eq!(h.workflow.snapshot().remaining_slots, Some(180));

    h.store.0.borrow_mut().fail_reads = true;
    assert!(block_on(h.workflow.refresh_slots()).is_err());
    assert_eq!(h.workflow.snapshot().remaining_slots, Some(180));
}

#[test]
fn listener_sees_each_transition() {
    let h = harness(FakeStore::default(), FakeNotifier::default());
    let phases = Rc::new(RefCell::new(Vec::new()));
    let seen = phases.clone();
    h.workflow
        .set_listener(move |s| seen.borrow_mut().push(s.phase));

    h.workflow.set_handle("apoc");
    block_on(h.workflow.confirm_handle()).unwrap();
    h.workflow.set_full_name("Apoc");
    h.workflow.set_email("apoc@example.com");
    block_on(h.workflow.submit()).unwrap();

    let phases = phases.borrow();
    let mut distinct: Vec<Phase> = Vec::new();
    for p in phases.iter() {
        if distinct.last() != Some(p) {
            distinct.push(*p);
        }
    }
    assert_eq!(
        distinct,
        vec![
            Phase::Idle,
            Phase::Validating,
            Phase::ExtendedForm,
            Phase::Submitting,
            Phase::Complete,
        ]
    );
}

#[test]
fn handle_is_locked_after_first_step() {
    let h = harness(FakeStore::default(), FakeNotifier::default());
    at_extended_form(&h, "dozer", "d@example.com");
    h.workflow.set_handle("other");
    assert_eq!(h.workflow.snapshot().handle, "dozer");

    h.workflow.back_to_handle();
    assert_eq!(h.workflow.snapshot().phase, Phase::Idle);
    h.workflow.set_handle("other");
    assert_eq!(h.workflow.snapshot().handle, "other");
}

#[test]
fn last_slot_is_still_claimable() {
    let h = harness(FakeStore::with_total(299), FakeNotifier::default());
    at_extended_form(&h, "last", "last@example.com");
    let receipt = block_on(h.workflow.submit()).unwrap();
    assert_eq!(receipt.position, 300);
    assert_eq!(h.workflow.snapshot().remaining_slots, Some(0));
}
