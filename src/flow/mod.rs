//! Submission flow: validate, submit exactly once, show timed feedback.
//!
//! One flow instance owns one submission lifecycle at a time. The remote call
//! runs on the async runtime; its outcome and the timed feedback events are
//! marshalled back to the owning task over an event channel, so all
//! user-visible state changes are observed in one place.

pub mod feedback;
pub mod selection;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::{AggregateRefresh, RemoteError};
use feedback::{FeedbackBanner, FlowTimers};

/// How long a result banner stays visible.
pub const BANNER_DURATION: Duration = Duration::from_millis(2_000);

/// How long after a successful submission the flow asks to be dismissed.
/// Runs on its own timer, independent of the banner's.
pub const DISMISS_DELAY: Duration = Duration::from_millis(1_500);

/// A single submission, immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub id: Uuid,
    /// What is being acted on (photo URL owner, profile document id, ...).
    pub subject_id: String,
    /// Who is acting.
    pub actor_id: String,
    /// Flow-specific body, interpreted by the submitter.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Reused across manual retries of the same submission.
    pub idempotency_key: String,
}

impl SubmissionRequest {
    pub fn new(
        subject_id: impl Into<String>,
        actor_id: impl Into<String>,
        payload: serde_json::Value,
        idempotency_key: impl Into<String>,
    ) -> Self {
        SubmissionRequest {
            id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            actor_id: actor_id.into(),
            payload,
            created_at: Utc::now(),
            idempotency_key: idempotency_key.into(),
        }
    }

    /// Identifier checks that must pass before any remote call is attempted.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.subject_id.trim().is_empty() {
            errors.push("Subject ID is required".to_string());
        }
        if self.actor_id.trim().is_empty() {
            errors.push("Actor ID is required".to_string());
        }
        if self.idempotency_key.trim().is_empty() {
            errors.push("Idempotency key is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The one remote operation a flow performs.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), RemoteError>;
}

/// Why a submission did not go through.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid submission: {}", .0.join(", "))]
    InvalidRequest(Vec<String>),

    /// A submission on this flow instance is still awaiting its result.
    /// No remote call was made; retry after the first one settles.
    #[error("another submission is already in progress")]
    AlreadyInFlight,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type SubmissionResult = Result<(), FlowError>;

/// Lifecycle of the submission currently owning the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Validating,
    Submitting,
    Feedback,
    ScheduledDismiss,
    Dismissed,
}

/// Events delivered to the task driving the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    BannerShown(FeedbackBanner),
    BannerCleared,
    /// A dependent aggregate view should reload. Sent once per success.
    RefreshRequested,
    /// The success dismiss timer fired; the view hosting the flow can close.
    DismissRequested,
}

struct FlowShared {
    in_flight: AtomicBool,
    state: Mutex<FlowState>,
    events: mpsc::UnboundedSender<FlowEvent>,
}

impl FlowShared {
    fn set_state(&self, next: FlowState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug!(from = ?*state, to = ?next, "flow state change");
        *state = next;
    }

    fn send(&self, event: FlowEvent) {
        // The receiver half may be gone during teardown; nothing to do then.
        let _ = self.events.send(event);
    }
}

/// Orchestrates one submission at a time against an injected submitter.
///
/// Dropping the flow aborts any pending banner/dismiss timers, so a disposed
/// flow never delivers late events.
pub struct SubmissionFlow {
    submitter: Arc<dyn Submitter>,
    refresh: Arc<dyn AggregateRefresh>,
    success_message: String,
    shared: Arc<FlowShared>,
    timers: Mutex<FlowTimers>,
}

impl SubmissionFlow {
    pub fn new(
        submitter: Arc<dyn Submitter>,
        refresh: Arc<dyn AggregateRefresh>,
        success_message: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<FlowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let flow = SubmissionFlow {
            submitter,
            refresh,
            success_message: success_message.into(),
            shared: Arc::new(FlowShared {
                in_flight: AtomicBool::new(false),
                state: Mutex::new(FlowState::Idle),
                events: tx,
            }),
            timers: Mutex::new(FlowTimers::default()),
        };
        (flow, rx)
    }

    #[allow(dead_code)]
    pub fn state(&self) -> FlowState {
        *self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one submission to completion.
    ///
    /// At most one submission is in flight per flow instance: the latch is
    /// taken before anything else happens and released only after the remote
    /// result has been observed. A concurrent call loses the latch race and
    /// fails locally with `AlreadyInFlight`, issuing no remote write.
    pub async fn submit(&self, request: SubmissionRequest) -> SubmissionResult {
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(request_id = %request.id, "submission rejected: already in flight");
            return Err(FlowError::AlreadyInFlight);
        }

        self.shared.set_state(FlowState::Validating);
        if let Err(errors) = request.validate() {
            self.shared.in_flight.store(false, Ordering::Release);
            self.shared.set_state(FlowState::Idle);
            debug!(request_id = %request.id, ?errors, "submission rejected before remote call");
            return Err(FlowError::InvalidRequest(errors));
        }

        self.shared.set_state(FlowState::Submitting);
        let outcome = self.submitter.submit(&request).await;
        self.shared.in_flight.store(false, Ordering::Release);

        match outcome {
            Ok(()) => {
                debug!(request_id = %request.id, "submission accepted");
                self.shared.set_state(FlowState::Feedback);
                self.schedule_feedback(self.success_message.clone(), BANNER_DURATION);
                self.refresh.refresh();
                self.shared.send(FlowEvent::RefreshRequested);
                self.schedule_dismiss(DISMISS_DELAY);
                self.shared.set_state(FlowState::ScheduledDismiss);
                Ok(())
            }
            Err(err) => {
                debug!(request_id = %request.id, error = %err, "submission failed");
                self.shared.set_state(FlowState::Feedback);
                self.schedule_feedback(err.to_string(), BANNER_DURATION);
                // Failure is recoverable: back to Idle so the user can retry.
                self.shared.set_state(FlowState::Idle);
                Err(err.into())
            }
        }
    }

    /// Show a banner now and schedule its clear after `duration`.
    ///
    /// Scheduling a new banner cancels the previous banner timer, so a retry
    /// right after a failure never clears the fresh banner early.
    pub fn schedule_feedback(&self, message: impl Into<String>, duration: Duration) -> FeedbackBanner {
        let banner = FeedbackBanner::new(message, duration);
        self.shared.send(FlowEvent::BannerShown(banner.clone()));

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            shared.send(FlowEvent::BannerCleared);
        });
        self.timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_banner(handle);

        banner
    }

    /// Schedule the dismiss signal after `delay`. Success path only.
    pub fn schedule_dismiss(&self, delay: Duration) {
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.set_state(FlowState::Dismissed);
            shared.send(FlowEvent::DismissRequested);
        });
        self.timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_dismiss(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NoRefresh;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{advance, Instant};

    struct CountingSubmitter {
        calls: AtomicUsize,
        delay: Duration,
        outcome: fn() -> Result<(), RemoteError>,
    }

    impl CountingSubmitter {
        fn succeeding() -> Arc<Self> {
            Arc::new(CountingSubmitter {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                outcome: || Ok(()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(CountingSubmitter {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                outcome: || {
                    Err(RemoteError::Service {
                        status: 503,
                        message: "unavailable".to_string(),
                    })
                },
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(CountingSubmitter {
                calls: AtomicUsize::new(0),
                delay,
                outcome: || Ok(()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Submitter for CountingSubmitter {
        async fn submit(&self, _request: &SubmissionRequest) -> Result<(), RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.outcome)()
        }
    }

    struct CountingRefresh {
        calls: AtomicUsize,
    }

    impl CountingRefresh {
        fn new() -> Arc<Self> {
            Arc::new(CountingRefresh {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl AggregateRefresh for CountingRefresh {
        fn refresh(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request() -> SubmissionRequest {
        SubmissionRequest::new("photo-123", "user-1", json!({"k": "v"}), "key-1")
    }

    #[tokio::test]
    async fn empty_subject_is_rejected_before_any_remote_call() {
        let submitter = CountingSubmitter::succeeding();
        let (flow, _events) =
            SubmissionFlow::new(submitter.clone(), Arc::new(NoRefresh), "Sent");

        let request = SubmissionRequest::new("", "user-1", json!({}), "key-1");
        let result = flow.submit(request).await;

        assert!(matches!(result, Err(FlowError::InvalidRequest(_))));
        assert_eq!(submitter.call_count(), 0);
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn empty_actor_is_rejected_before_any_remote_call() {
        let submitter = CountingSubmitter::succeeding();
        let (flow, _events) =
            SubmissionFlow::new(submitter.clone(), Arc::new(NoRefresh), "Sent");

        let request = SubmissionRequest::new("photo-123", "", json!({}), "key-1");
        let result = flow.submit(request).await;

        assert!(matches!(result, Err(FlowError::InvalidRequest(_))));
        assert_eq!(submitter.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submit_yields_exactly_one_remote_call() {
        let submitter = CountingSubmitter::slow(Duration::from_millis(100));
        let (flow, _events) =
            SubmissionFlow::new(submitter.clone(), Arc::new(NoRefresh), "Sent");
        let flow = Arc::new(flow);

        let first = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.submit(request()).await }
        });
        // Let the first submission take the latch and park on the remote call.
        tokio::task::yield_now().await;

        let second = flow.submit(request()).await;
        assert!(matches!(second, Err(FlowError::AlreadyInFlight)));

        advance(Duration::from_millis(100)).await;
        first.await.expect("task panicked").expect("first submit failed");
        assert_eq!(submitter.call_count(), 1);
    }

    #[tokio::test]
    async fn retry_is_allowed_after_the_first_submission_settles() {
        let submitter = CountingSubmitter::failing();
        let (flow, _events) =
            SubmissionFlow::new(submitter.clone(), Arc::new(NoRefresh), "Sent");

        assert!(flow.submit(request()).await.is_err());
        assert_eq!(flow.state(), FlowState::Idle);

        assert!(flow.submit(request()).await.is_err());
        assert_eq!(submitter.call_count(), 2);
    }

    #[tokio::test]
    async fn success_triggers_exactly_one_refresh() {
        let refresh = CountingRefresh::new();
        let (flow, _events) =
            SubmissionFlow::new(CountingSubmitter::succeeding(), refresh.clone(), "Sent");

        flow.submit(request()).await.expect("submit failed");
        assert_eq!(refresh.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_triggers_no_refresh() {
        let refresh = CountingRefresh::new();
        let (flow, _events) =
            SubmissionFlow::new(CountingSubmitter::failing(), refresh.clone(), "Sent");

        assert!(flow.submit(request()).await.is_err());
        assert_eq!(refresh.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn banner_and_dismiss_run_on_independent_timers() {
        let (flow, mut events) =
            SubmissionFlow::new(CountingSubmitter::succeeding(), Arc::new(NoRefresh), "Sent");

        let start = Instant::now();
        flow.submit(request()).await.expect("submit failed");

        let banner = match events.recv().await {
            Some(FlowEvent::BannerShown(banner)) => banner,
            other => panic!("expected BannerShown, got {other:?}"),
        };
        assert_eq!(banner.visible_until, start + BANNER_DURATION);
        assert_eq!(events.recv().await, Some(FlowEvent::RefreshRequested));

        // Dismiss fires at 1.5s, the banner clear at 2.0s.
        assert_eq!(events.recv().await, Some(FlowEvent::DismissRequested));
        assert_eq!(Instant::now() - start, DISMISS_DELAY);
        assert_eq!(flow.state(), FlowState::Dismissed);

        assert_eq!(events.recv().await, Some(FlowEvent::BannerCleared));
        assert_eq!(Instant::now() - start, BANNER_DURATION);
    }

    #[tokio::test(start_paused = true)]
    async fn no_dismiss_before_its_delay_elapses() {
        let (flow, mut events) =
            SubmissionFlow::new(CountingSubmitter::succeeding(), Arc::new(NoRefresh), "Sent");

        flow.submit(request()).await.expect("submit failed");
        assert!(matches!(events.try_recv(), Ok(FlowEvent::BannerShown(_))));
        assert!(matches!(events.try_recv(), Ok(FlowEvent::RefreshRequested)));

        tokio::task::yield_now().await;
        advance(Duration::from_millis(1_400)).await;
        tokio::task::yield_now().await;
        assert!(events.try_recv().is_err());

        advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert!(matches!(events.try_recv(), Ok(FlowEvent::DismissRequested)));
    }

    #[tokio::test]
    async fn failure_schedules_banner_but_no_dismiss() {
        let (flow, mut events) =
            SubmissionFlow::new(CountingSubmitter::failing(), Arc::new(NoRefresh), "Sent");

        assert!(flow.submit(request()).await.is_err());
        assert!(matches!(events.try_recv(), Ok(FlowEvent::BannerShown(_))));
        // No refresh and no dismiss were queued.
        assert!(events.try_recv().is_err());
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_timers() {
        let (flow, mut events) =
            SubmissionFlow::new(CountingSubmitter::succeeding(), Arc::new(NoRefresh), "Sent");

        flow.submit(request()).await.expect("submit failed");
        assert!(matches!(events.try_recv(), Ok(FlowEvent::BannerShown(_))));
        assert!(matches!(events.try_recv(), Ok(FlowEvent::RefreshRequested)));

        drop(flow);
        advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        // Both timer tasks were aborted with the flow: the channel closes
        // without ever delivering a dismiss or banner-clear event.
        assert_eq!(events.recv().await, None);
    }
}
