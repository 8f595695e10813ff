use std::fmt;

/// Lifecycle stage of a cached bundle. Absent from the cache means unloaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BundleStage {
    /// Download or decode in flight.
    Loading,
    /// Decoded and referenced.
    Loaded,
    /// Decoded, unreferenced, waiting out the retain window.
    Retained,
}

impl fmt::Display for BundleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Retained => "retained",
        };
        f.write_str(s)
    }
}

/// Snapshot of the provider's cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProviderStats {
    pub loading: usize,
    pub loaded: usize,
    pub retained: usize,
    /// Distinct assets currently held by callers.
    pub assets: usize,
    /// Async requests waiting on their bundles.
    pub pending_requests: usize,
    /// Bundle downloads started since creation.
    pub downloads: u64,
    /// Bundles dropped from the cache since creation.
    pub unloads: u64,
}

impl ProviderStats {
    pub fn bundles(&self) -> usize {
        self.loading + self.loaded + self.retained
    }
}
