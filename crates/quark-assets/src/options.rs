use quark_bundle::{MANIFEST_NAME, ManifestCipher};
use quark_net::RetryPolicy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Seconds an unreferenced bundle stays cached before it is unloaded.
pub const DEFAULT_RETAIN_TIME: f32 = 3.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetOptions {
    /// Debounce window after the last release. `<= 0` unloads immediately.
    pub retain_time: f32,
    /// Directory URL bundles and the manifest are fetched from. Must end with `/`.
    pub base_url: Option<Url>,
    /// Fetch bundles by their flattened names.
    pub flatten_names: bool,
    /// Check fetched blobs against the manifest hash when one is recorded.
    pub verify_hash: bool,
    pub retry_policy: RetryPolicy,
    pub manifest_name: String,
    /// Key the manifest is encrypted with, if any.
    pub cipher: Option<ManifestCipher>,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            retain_time: DEFAULT_RETAIN_TIME,
            base_url: None,
            flatten_names: false,
            verify_hash: true,
            retry_policy: RetryPolicy::default(),
            manifest_name: MANIFEST_NAME.to_owned(),
            cipher: None,
        }
    }
}

impl AssetOptions {
    #[must_use]
    pub fn with_retain_time(mut self, secs: f32) -> Self {
        self.retain_time = secs;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_flatten_names(mut self, flatten: bool) -> Self {
        self.flatten_names = flatten;
        self
    }

    #[must_use]
    pub fn with_verify_hash(mut self, verify: bool) -> Self {
        self.verify_hash = verify;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[must_use]
    pub fn with_manifest_name<S: Into<String>>(mut self, name: S) -> Self {
        self.manifest_name = name.into();
        self
    }

    #[must_use]
    pub fn with_cipher(mut self, cipher: ManifestCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }
}
