use std::{fmt, rc::Rc, sync::Arc};

use bytes::Bytes;
use tokio::{runtime::Handle, sync::oneshot};
use tracing::trace;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    progress::FetchProgress,
    traits::Net,
};

/// Result of a fetch that may still be in flight.
///
/// Polled from the tick thread with [`PendingFetch::try_take`]; the IO side completes it through
/// a [`FetchCompleter`] from any thread.
pub struct PendingFetch {
    state: PendingState,
    progress: FetchProgress,
}

enum PendingState {
    Ready(NetResult<Bytes>),
    Waiting(oneshot::Receiver<NetResult<Bytes>>),
    Taken,
}

/// Sending half of a [`PendingFetch`].
pub struct FetchCompleter {
    tx: oneshot::Sender<NetResult<Bytes>>,
    progress: FetchProgress,
}

impl FetchCompleter {
    /// Counters the transport fills while receiving.
    pub fn progress(&self) -> &FetchProgress {
        &self.progress
    }

    /// Delivers the result. A dropped receiver is ignored.
    pub fn complete(self, result: NetResult<Bytes>) {
        if let Ok(bytes) = &result {
            self.progress.finish(bytes.len() as u64);
        }
        let _ = self.tx.send(result);
    }
}

impl PendingFetch {
    pub fn channel() -> (FetchCompleter, PendingFetch) {
        let (tx, rx) = oneshot::channel();
        let progress = FetchProgress::new();
        (
            FetchCompleter {
                tx,
                progress: progress.clone(),
            },
            PendingFetch {
                state: PendingState::Waiting(rx),
                progress,
            },
        )
    }

    pub fn ready(result: NetResult<Bytes>) -> Self {
        let progress = FetchProgress::new();
        if let Ok(bytes) = &result {
            progress.finish(bytes.len() as u64);
        }
        Self {
            state: PendingState::Ready(result),
            progress,
        }
    }

    /// Received fraction of the body, `1.0` once a successful result arrived.
    pub fn progress(&self) -> f32 {
        self.progress.fraction()
    }

    /// Takes the result once available. Returns `None` while in flight and after the result
    /// was taken. A completer dropped without a result yields [`NetError::Cancelled`].
    pub fn try_take(&mut self) -> Option<NetResult<Bytes>> {
        match std::mem::replace(&mut self.state, PendingState::Taken) {
            PendingState::Ready(result) => Some(result),
            PendingState::Waiting(mut rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(oneshot::error::TryRecvError::Empty) => {
                    self.state = PendingState::Waiting(rx);
                    None
                }
                Err(oneshot::error::TryRecvError::Closed) => Some(Err(NetError::Cancelled)),
            },
            PendingState::Taken => None,
        }
    }

    pub fn is_taken(&self) -> bool {
        matches!(self.state, PendingState::Taken)
    }
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            PendingState::Ready(_) => "ready",
            PendingState::Waiting(_) => "waiting",
            PendingState::Taken => "taken",
        };
        f.debug_struct("PendingFetch")
            .field("state", &state)
            .field("progress", &self.progress)
            .finish()
    }
}

/// Starts fetches on behalf of the tick thread.
pub trait Fetcher {
    fn fetch(&self, url: &Url) -> PendingFetch;
}

impl<F: Fetcher + ?Sized> Fetcher for Rc<F> {
    fn fetch(&self, url: &Url) -> PendingFetch {
        (**self).fetch(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, url: &Url) -> PendingFetch {
        (**self).fetch(url)
    }
}

/// [`Fetcher`] that runs a [`Net`] transport on a tokio runtime.
pub struct NetFetcher<N> {
    net: Arc<N>,
    runtime: Handle,
}

impl<N: Net + 'static> NetFetcher<N> {
    pub fn new(net: N, runtime: Handle) -> Self {
        Self {
            net: Arc::new(net),
            runtime,
        }
    }

    /// Uses the runtime the caller is currently inside.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current(net: N) -> Self {
        Self::new(net, Handle::current())
    }
}

impl<N: Net + 'static> Fetcher for NetFetcher<N> {
    fn fetch(&self, url: &Url) -> PendingFetch {
        let (completer, pending) = PendingFetch::channel();
        let net = Arc::clone(&self.net);
        let url = url.clone();
        trace!(%url, "fetch spawned");
        self.runtime.spawn(async move {
            let progress = completer.progress().clone();
            completer.complete(net.get_bytes_with_progress(url, &progress).await);
        });
        pending
    }
}

impl<N> fmt::Debug for NetFetcher<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetFetcher").finish_non_exhaustive()
    }
}
