//! In-memory [`Fetcher`] with call accounting and failure injection.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
};

use bytes::Bytes;
use quark_net::{FetchCompleter, Fetcher, NetError, NetResult, PendingFetch};
use url::Url;

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, Bytes>,
    failures: HashMap<String, VecDeque<NetError>>,
    calls: HashMap<String, u32>,
    hold: bool,
    held: Vec<(FetchCompleter, NetResult<Bytes>)>,
}

/// Serves blobs from a map keyed by full URL.
///
/// By default results are ready immediately. In hold mode every fetch stays in flight until
/// [`MemFetcher::release_held`] is called, which makes in-flight coalescing observable.
#[derive(Default)]
pub struct MemFetcher {
    inner: RefCell<Inner>,
}

impl MemFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &Url, data: impl Into<Bytes>) {
        self.inner
            .borrow_mut()
            .blobs
            .insert(url.to_string(), data.into());
    }

    pub fn remove(&self, url: &Url) {
        self.inner.borrow_mut().blobs.remove(url.as_str());
    }

    /// The next `times` fetches of `url` fail with `error`.
    pub fn fail_next(&self, url: &Url, error: NetError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        let queue = inner.failures.entry(url.to_string()).or_default();
        queue.extend(std::iter::repeat_n(error, times));
    }

    pub fn set_hold(&self, hold: bool) {
        self.inner.borrow_mut().hold = hold;
    }

    /// Completes every held fetch. Returns how many were released.
    pub fn release_held(&self) -> usize {
        let held = std::mem::take(&mut self.inner.borrow_mut().held);
        let count = held.len();
        for (completer, result) in held {
            completer.complete(result);
        }
        count
    }

    pub fn held_count(&self) -> usize {
        self.inner.borrow().held.len()
    }

    pub fn calls(&self, url: &Url) -> u32 {
        self.inner
            .borrow()
            .calls
            .get(url.as_str())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.inner.borrow().calls.values().sum()
    }
}

impl Fetcher for MemFetcher {
    fn fetch(&self, url: &Url) -> PendingFetch {
        let mut inner = self.inner.borrow_mut();
        let key = url.to_string();
        *inner.calls.entry(key.clone()).or_default() += 1;

        let failure = inner.failures.get_mut(&key).and_then(VecDeque::pop_front);
        let result = match failure {
            Some(error) => Err(error),
            None => inner
                .blobs
                .get(&key)
                .cloned()
                .ok_or_else(|| NetError::http_status(404, key.clone())),
        };

        if inner.hold {
            let (completer, pending) = PendingFetch::channel();
            inner.held.push((completer, result));
            pending
        } else {
            PendingFetch::ready(result)
        }
    }
}
