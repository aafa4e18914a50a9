use moonxbt_core::models::{
    AsyncRequestState, AsyncTicket, RequestStatus, SubmitResponse, TaskStatusResponse,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::TaskBackend;

/// Error recorded when a status call fails.
pub const STATUS_ERROR: &str = "Failed to get status";
/// Error recorded when the polling budget runs out.
pub const TIMEOUT_ERROR: &str = "Request timeout";

const FAILED_FALLBACK: &str = "Request failed";

pub type CompletedCallback = Arc<dyn Fn(&Value) + Send + Sync>;
pub type FailedCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub struct PollOptions {
    pub poll_interval: Duration,
    /// Budget measured from the moment the ticket is received. Checked before each
    /// status call, so the real cutoff may lag by up to one interval.
    pub max_polling_time: Duration,
    pub on_completed: Option<CompletedCallback>,
    pub on_failed: Option<FailedCallback>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polling_time: Duration::from_secs(10 * 60),
            on_completed: None,
            on_failed: None,
        }
    }
}

impl PollOptions {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polling_time(mut self, max: Duration) -> Self {
        self.max_polling_time = max;
        self
    }

    pub fn on_completed(mut self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_completed = Some(Arc::new(callback));
        self
    }

    pub fn on_failed(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_failed = Some(Arc::new(callback));
        self
    }

    fn completed(&self, result: &Value) {
        if let Some(callback) = &self.on_completed {
            callback(result);
        }
    }

    fn failed(&self, error: &str) {
        if let Some(callback) = &self.on_failed {
            callback(error);
        }
    }
}

struct PollerShared {
    state: watch::Sender<AsyncRequestState>,
    /// Token of the current run. Held while writing state, so a cancelled run can
    /// never write after `reset`.
    current: Mutex<CancellationToken>,
}

impl PollerShared {
    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the previous run and start a new one in the loading state.
    fn begin(&self) -> CancellationToken {
        let mut current = self.lock();
        current.cancel();
        *current = CancellationToken::new();
        self.state.send_replace(AsyncRequestState {
            is_loading: true,
            ..AsyncRequestState::default()
        });
        current.clone()
    }

    fn reset(&self) {
        let mut current = self.lock();
        current.cancel();
        *current = CancellationToken::new();
        self.state.send_replace(AsyncRequestState::default());
    }

    /// Apply `update` for the run owning `token`. `None` once that run is cancelled.
    fn apply(
        &self,
        token: &CancellationToken,
        update: impl FnOnce(&mut AsyncRequestState),
    ) -> Option<AsyncRequestState> {
        let _current = self.lock();
        if token.is_cancelled() {
            return None;
        }
        self.state.send_modify(update);
        Some(self.state.borrow().clone())
    }

    fn fail(&self, token: &CancellationToken, options: &PollOptions, error: &str) {
        let applied = self.apply(token, |state| {
            state.status = RequestStatus::Failed;
            state.error = Some(error.to_string());
            state.is_loading = false;
        });
        if applied.is_some() {
            options.failed(error);
        }
    }
}

/// Fold one status answer into the state, never moving the status backwards.
fn apply_status(state: &mut AsyncRequestState, response: &TaskStatusResponse) {
    if state.status.can_advance_to(response.status) {
        state.status = response.status;
    }
    state.progress = match response.progress {
        Some(_) => response.progress_percent(),
        None if state.status == RequestStatus::Completed => 100,
        None => state.progress,
    };
    if let Some(payload) = response.payload() {
        state.result = Some(payload);
    }
    if response.error.is_some() {
        state.error = response.error.clone();
    }
    if state.status == RequestStatus::Failed && state.error.is_none() {
        state.error = Some(FAILED_FALLBACK.to_string());
    }
    state.is_loading = !state.status.is_terminal();
}

fn ticket_status(ticket: &AsyncTicket) -> RequestStatus {
    match ticket.status {
        RequestStatus::Processing => RequestStatus::Processing,
        _ => RequestStatus::Pending,
    }
}

async fn poll_ticket(
    backend: Arc<dyn TaskBackend>,
    options: PollOptions,
    shared: Arc<PollerShared>,
    token: CancellationToken,
    ticket_id: String,
) {
    let started = Instant::now();
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(options.poll_interval) => {}
        }

        if started.elapsed() > options.max_polling_time {
            tracing::warn!(ticket_id = %ticket_id, elapsed = ?started.elapsed(), "Polling budget exhausted");
            shared.fail(&token, &options, TIMEOUT_ERROR);
            return;
        }

        let response = tokio::select! {
            _ = token.cancelled() => return,
            response = backend.status(&ticket_id) => response,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(ticket_id = %ticket_id, error = %err, "Status check failed");
                shared.fail(&token, &options, STATUS_ERROR);
                return;
            }
        };

        let Some(state) = shared.apply(&token, |state| apply_status(state, &response)) else {
            return;
        };
        tracing::debug!(ticket_id = %ticket_id, status = %state.status, progress = state.progress, "Polled ticket");
        match state.status {
            RequestStatus::Completed => {
                options.completed(state.result.as_ref().unwrap_or(&Value::Null));
                return;
            }
            RequestStatus::Failed => {
                options.failed(state.error.as_deref().unwrap_or(FAILED_FALLBACK));
                return;
            }
            _ => {}
        }
    }
}

/// Runs one submission at a time and exposes its state.
///
/// A new submission or [`AsyncRequestPoller::reset`] cancels the previous run;
/// answers that arrive for a cancelled run are dropped. Dropping the poller
/// cancels the current run.
pub struct AsyncRequestPoller {
    backend: Arc<dyn TaskBackend>,
    options: PollOptions,
    shared: Arc<PollerShared>,
}

impl AsyncRequestPoller {
    pub fn new(backend: Arc<dyn TaskBackend>, options: PollOptions) -> Self {
        let (state, _) = watch::channel(AsyncRequestState::default());
        Self {
            backend,
            options,
            shared: Arc::new(PollerShared {
                state,
                current: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// POST `payload` to `endpoint`. A direct answer completes the request; a
    /// ticket starts background polling. Returns the state after submission.
    pub async fn submit_request(&self, endpoint: &str, payload: Value) -> AsyncRequestState {
        let token = self.shared.begin();
        tracing::debug!(endpoint, "Submitting request");

        let response = tokio::select! {
            _ = token.cancelled() => return self.state(),
            response = self.backend.submit(endpoint, &payload) => response,
        };

        match response {
            Ok(SubmitResponse::Immediate(result)) => {
                let stored = result.clone();
                let applied = self.shared.apply(&token, move |state| {
                    state.status = RequestStatus::Completed;
                    state.progress = 100;
                    state.result = Some(stored);
                    state.is_loading = false;
                });
                if applied.is_some() {
                    self.options.completed(&result);
                }
            }
            Ok(SubmitResponse::Async(ticket)) => self.track(token, ticket),
            Err(err) => {
                tracing::warn!(endpoint, error = %err, "Submission failed");
                let message = err.to_string();
                let message = if message.is_empty() {
                    FAILED_FALLBACK.to_string()
                } else {
                    message
                };
                self.shared.fail(&token, &self.options, &message);
            }
        }

        self.state()
    }

    /// Poll a ticket issued by another call, e.g. a task id returned by a
    /// route that does not answer with `isAsync`. Cancels the current run.
    pub fn track_ticket(&self, ticket: AsyncTicket) -> AsyncRequestState {
        let token = self.shared.begin();
        self.track(token, ticket);
        self.state()
    }

    fn track(&self, token: CancellationToken, ticket: AsyncTicket) {
        let status = ticket_status(&ticket);
        let ticket_id = ticket.ticket_id.clone();
        let applied = self.shared.apply(&token, move |state| {
            state.ticket_id = Some(ticket.ticket_id);
            state.status = status;
            state.estimated_time = ticket.estimated_time;
            state.is_loading = true;
        });
        if applied.is_some() {
            tracing::info!(ticket_id = %ticket_id, "Request accepted, polling for result");
            tokio::spawn(poll_ticket(
                Arc::clone(&self.backend),
                self.options.clone(),
                Arc::clone(&self.shared),
                token,
                ticket_id,
            ));
        }
    }

    /// Cancel the current run and return to the idle state.
    pub fn reset(&self) {
        self.shared.reset();
    }

    pub fn state(&self) -> AsyncRequestState {
        self.shared.state.borrow().clone()
    }

    /// Receiver that sees every state change.
    pub fn watch(&self) -> watch::Receiver<AsyncRequestState> {
        self.shared.state.subscribe()
    }

    /// Resolve once the current run is terminal, or at once when nothing runs.
    pub async fn wait_for_terminal(&self) -> AsyncRequestState {
        let mut rx = self.watch();
        let settled = rx
            .wait_for(|state| {
                state.status.is_terminal()
                    || (state.status == RequestStatus::Idle && !state.is_loading)
            })
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

impl Drop for AsyncRequestPoller {
    fn drop(&mut self) {
        self.shared.lock().cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::async_request::PollError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        submit: Result<SubmitResponse, PollError>,
        statuses: Mutex<VecDeque<Result<TaskStatusResponse, PollError>>>,
        status_calls: AtomicUsize,
        latency: Duration,
    }

    impl ScriptedBackend {
        fn new(
            submit: Result<SubmitResponse, PollError>,
            statuses: Vec<Result<TaskStatusResponse, PollError>>,
        ) -> Arc<Self> {
            Self::slow(submit, statuses, Duration::ZERO)
        }

        fn slow(
            submit: Result<SubmitResponse, PollError>,
            statuses: Vec<Result<TaskStatusResponse, PollError>>,
            latency: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                submit,
                statuses: Mutex::new(statuses.into()),
                status_calls: AtomicUsize::new(0),
                latency,
            })
        }

        fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskBackend for ScriptedBackend {
        async fn submit(&self, _endpoint: &str, _payload: &Value) -> Result<SubmitResponse, PollError> {
            self.submit.clone()
        }

        async fn status(&self, _ticket_id: &str) -> Result<TaskStatusResponse, PollError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(status(json!({"status": "processing"}))))
        }
    }

    fn status(value: Value) -> TaskStatusResponse {
        serde_json::from_value(value).unwrap()
    }

    fn ticket() -> Result<SubmitResponse, PollError> {
        Ok(SubmitResponse::from_value(json!({"isAsync": true, "ticketId": "t1", "status": "pending"})).unwrap())
    }

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
    }

    fn counting_options(completed: &Arc<AtomicUsize>, failed: &Arc<AtomicUsize>) -> PollOptions {
        let completed = Arc::clone(completed);
        let failed = Arc::clone(failed);
        PollOptions::default()
            .on_completed(move |_| {
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .on_failed(move |_| {
                failed.fetch_add(1, Ordering::SeqCst);
            })
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_answer_completes_without_polling() {
        let backend = ScriptedBackend::new(Ok(SubmitResponse::Immediate(json!({"x": 1}))), vec![]);
        let (completed, failed) = counter();
        let poller = AsyncRequestPoller::new(backend.clone(), counting_options(&completed, &failed));

        let state = poller.submit_request("/api/work", json!({})).await;
        assert_eq!(state.status, RequestStatus::Completed);
        assert_eq!(state.result, Some(json!({"x": 1})));
        assert!(!state.is_loading);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.status_calls(), 0);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_ticket_until_completed() {
        let backend = ScriptedBackend::new(
            ticket(),
            vec![
                Ok(status(json!({"status": "pending"}))),
                Ok(status(json!({"status": "processing", "progress": 40}))),
                Ok(status(json!({"status": "completed", "result": {"x": 1}}))),
            ],
        );
        let (completed, failed) = counter();
        let poller = AsyncRequestPoller::new(backend.clone(), counting_options(&completed, &failed));

        let state = poller.submit_request("/api/work", json!({})).await;
        assert_eq!(state.status, RequestStatus::Pending);
        assert_eq!(state.ticket_id.as_deref(), Some("t1"));
        assert!(state.is_loading);

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = poller.state();
        assert_eq!(state.status, RequestStatus::Processing);
        assert_eq!(state.progress, 40);

        let state = poller.wait_for_terminal().await;
        assert_eq!(state.status, RequestStatus::Completed);
        assert_eq!(state.result, Some(json!({"x": 1})));
        assert_eq!(state.progress, 100);
        assert!(!state.is_loading);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.status_calls(), 3);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn status_never_moves_backwards() {
        let backend = ScriptedBackend::new(
            ticket(),
            vec![
                Ok(status(json!({"status": "processing", "progress": 50}))),
                Ok(status(json!({"status": "pending"}))),
            ],
        );
        let poller = AsyncRequestPoller::new(backend.clone(), PollOptions::default());
        poller.submit_request("/api/work", json!({})).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = poller.state();
        assert_eq!(backend.status_calls(), 2);
        assert_eq!(state.status, RequestStatus::Processing);
        assert_eq!(state.progress, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_polling_budget() {
        let backend = ScriptedBackend::new(ticket(), vec![]);
        let (completed, failed) = counter();
        let options = counting_options(&completed, &failed)
            .with_max_polling_time(Duration::from_secs(9));
        let poller = AsyncRequestPoller::new(backend.clone(), options);

        poller.submit_request("/api/work", json!({})).await;
        let state = poller.wait_for_terminal().await;

        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some(TIMEOUT_ERROR));
        // Polls at 2, 4, 6 and 8 seconds; the check at 10 is over budget.
        assert_eq!(backend.status_calls(), 4);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn status_failure_stops_polling() {
        let backend = ScriptedBackend::new(
            ticket(),
            vec![Err(PollError::Request("connection reset".to_string()))],
        );
        let poller = AsyncRequestPoller::new(backend.clone(), PollOptions::default());

        poller.submit_request("/api/work", json!({})).await;
        let state = poller.wait_for_terminal().await;

        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some(STATUS_ERROR));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_carries_its_error() {
        let backend = ScriptedBackend::new(
            ticket(),
            vec![Ok(status(json!({"status": "failed"})))],
        );
        let poller = AsyncRequestPoller::new(backend, PollOptions::default());

        poller.submit_request("/api/work", json!({})).await;
        let state = poller.wait_for_terminal().await;

        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Request failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_error_fails_request() {
        let backend = ScriptedBackend::new(Err(PollError::Request("boom".to_string())), vec![]);
        let (completed, failed) = counter();
        let poller = AsyncRequestPoller::new(backend.clone(), counting_options(&completed, &failed));

        let state = poller.submit_request("/api/work", json!({})).await;

        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(backend.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_late_answers() {
        let backend = ScriptedBackend::slow(
            ticket(),
            vec![Ok(status(json!({"status": "completed", "result": {"x": 1}})))],
            Duration::from_secs(3),
        );
        let (completed, failed) = counter();
        let poller = AsyncRequestPoller::new(backend.clone(), counting_options(&completed, &failed));

        poller.submit_request("/api/work", json!({})).await;
        // First status call starts at 2s and answers at 5s.
        tokio::time::sleep(Duration::from_secs(3)).await;
        poller.reset();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(poller.state(), AsyncRequestState::default());
        assert_eq!(backend.status_calls(), 1);
        assert_eq!(completed.load(Ordering::SeqCst), 0);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_terminal_returns_when_idle() {
        let backend = ScriptedBackend::new(ticket(), vec![]);
        let poller = AsyncRequestPoller::new(backend, PollOptions::default());

        assert_eq!(poller.wait_for_terminal().await, AsyncRequestState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn tracks_ticket_issued_elsewhere() {
        let backend = ScriptedBackend::new(
            Err(PollError::Request("unused".to_string())),
            vec![Ok(status(json!({"status": "completed", "result": {"url": "v.mp4"}})))],
        );
        let poller = AsyncRequestPoller::new(backend.clone(), PollOptions::default());

        let state = poller.track_ticket(AsyncTicket {
            ticket_id: "task-9".to_string(),
            status: RequestStatus::Pending,
            estimated_time: None,
        });
        assert_eq!(state.ticket_id.as_deref(), Some("task-9"));
        assert!(state.is_loading);

        let state = poller.wait_for_terminal().await;
        assert_eq!(state.status, RequestStatus::Completed);
        assert_eq!(state.result, Some(json!({"url": "v.mp4"})));
        assert_eq!(backend.status_calls(), 1);
    }
}
