use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Byte counters of one transfer, shared between the IO side and the tick thread.
///
/// A total of zero means the length is not known yet.
#[derive(Clone, Default)]
pub struct FetchProgress {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    total: AtomicU64,
}

impl FetchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&self, total: u64) {
        self.inner.total.store(total, Ordering::Relaxed);
    }

    pub fn add_received(&self, len: u64) {
        self.inner.received.fetch_add(len, Ordering::Relaxed);
    }

    /// Marks the transfer as fully received.
    pub fn finish(&self, len: u64) {
        // An empty body still reads as done.
        let len = len.max(1);
        self.inner.received.store(len, Ordering::Relaxed);
        self.inner.total.store(len, Ordering::Relaxed);
    }

    /// Restarts the counters for a new attempt.
    pub fn reset(&self) {
        self.inner.received.store(0, Ordering::Relaxed);
        self.inner.total.store(0, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.inner.received.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Option<u64> {
        match self.inner.total.load(Ordering::Relaxed) {
            0 => None,
            total => Some(total),
        }
    }

    /// Received fraction in `0.0..=1.0`; `0.0` while the length is unknown.
    pub fn fraction(&self) -> f32 {
        match self.total() {
            Some(total) => (self.received() as f64 / total as f64).min(1.0) as f32,
            None => 0.0,
        }
    }
}

impl fmt::Debug for FetchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchProgress")
            .field("received", &self.received())
            .field("total", &self.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::unknown_length(0, 300, 0.0)]
    #[case::partial(400, 100, 0.25)]
    #[case::overrun(100, 150, 1.0)]
    fn fraction_of_total(#[case] total: u64, #[case] received: u64, #[case] expected: f32) {
        let progress = FetchProgress::new();
        progress.set_total(total);
        progress.add_received(received);

        assert_eq!(progress.fraction(), expected);
    }

    #[test]
    fn clones_share_counters() {
        let progress = FetchProgress::new();
        let io_side = progress.clone();
        io_side.set_total(10);
        io_side.add_received(5);

        assert_eq!(progress.fraction(), 0.5);
    }

    #[rstest]
    #[case::empty_body(0)]
    #[case::body(42)]
    fn finish_is_complete(#[case] len: u64) {
        let progress = FetchProgress::new();
        progress.finish(len);

        assert_eq!(progress.fraction(), 1.0);
    }
}
