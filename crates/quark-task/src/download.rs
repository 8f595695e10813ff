use std::{fmt, rc::Rc};

use bytes::Bytes;
use quark_net::{Fetcher, NetError, PendingFetch, RetryPolicy};
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{TaskError, TaskResult},
    task::{Task, TaskState},
};

type Finish = Box<dyn FnOnce(TaskResult<Bytes>)>;

/// Downloads one blob through a [`Fetcher`], retrying retryable failures.
///
/// Back-off between attempts is measured in tick time; the task never sleeps.
pub struct DownloadTask {
    url: Url,
    fetcher: Rc<dyn Fetcher>,
    policy: RetryPolicy,
    state: TaskState,
    pending: Option<PendingFetch>,
    failures: u32,
    backoff: f32,
    on_finish: Option<Finish>,
}

impl DownloadTask {
    pub fn new<C>(url: Url, fetcher: Rc<dyn Fetcher>, policy: RetryPolicy, on_finish: C) -> Self
    where
        C: FnOnce(TaskResult<Bytes>) + 'static,
    {
        Self {
            url,
            fetcher,
            policy,
            state: TaskState::Waiting,
            pending: None,
            failures: 0,
            backoff: 0.0,
            on_finish: Some(Box::new(on_finish)),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Failed attempts so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn start(&mut self) {
        debug!(url = %self.url, attempt = self.failures + 1, "download started");
        self.pending = Some(self.fetcher.fetch(&self.url));
    }

    fn fail(&mut self, error: NetError) {
        self.failures += 1;
        if error.is_retryable() && self.policy.should_retry(self.failures) {
            let delay = self.policy.delay_for_attempt(self.failures);
            warn!(
                url = %self.url,
                failures = self.failures,
                delay_ms = delay.as_millis() as u64,
                %error,
                "download failed, retrying"
            );
            self.backoff = delay.as_secs_f32();
            if self.backoff <= 0.0 {
                self.start();
            }
            return;
        }

        warn!(url = %self.url, failures = self.failures, %error, "download aborted");
        self.finish(Err(TaskError::Network(error)));
    }

    fn finish(&mut self, result: TaskResult<Bytes>) {
        self.pending = None;
        self.state = if result.is_ok() {
            TaskState::Completed
        } else {
            TaskState::Aborted
        };
        if let Some(on_finish) = self.on_finish.take() {
            on_finish(result);
        }
    }
}

impl Task for DownloadTask {
    fn state(&self) -> TaskState {
        self.state
    }

    fn execute(&mut self) {
        self.state = TaskState::InProgress;
        self.start();
    }

    /// Received fraction of the current attempt.
    fn progress(&self) -> f32 {
        match self.state {
            TaskState::Completed => 1.0,
            TaskState::InProgress => self.pending.as_ref().map_or(0.0, PendingFetch::progress),
            TaskState::Waiting | TaskState::Aborted => 0.0,
        }
    }

    fn tick(&mut self, dt: f32) {
        if self.backoff > 0.0 {
            self.backoff -= dt;
            if self.backoff <= 0.0 {
                self.backoff = 0.0;
                self.start();
            }
            return;
        }

        let Some(result) = self.pending.as_mut().and_then(PendingFetch::try_take) else {
            return;
        };
        match result {
            Ok(bytes) => {
                debug!(url = %self.url, len = bytes.len(), "download complete");
                self.finish(Ok(bytes));
            }
            Err(error) => self.fail(error),
        }
    }

    fn cancel(&mut self) {
        if self.state.is_done() {
            return;
        }
        debug!(url = %self.url, "download cancelled");
        self.finish(Err(TaskError::Cancelled));
    }

    fn dispose(&mut self) {
        self.pending = None;
        self.on_finish = None;
    }
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTask")
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}
