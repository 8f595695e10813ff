use quark_assets::AssetOptions;
use quark_net::NetOptions;
use quark_timer::TimerOptions;
use serde::{Deserialize, Serialize};

use crate::error::RuntimeResult;

/// Settings for every engine, loadable from a JSON settings file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    pub timer: TimerOptions,
    pub assets: AssetOptions,
    pub net: NetOptions,
}

impl RuntimeOptions {
    /// Parses settings; absent sections and fields keep their defaults.
    ///
    /// # Errors
    ///
    /// [`crate::RuntimeError::Config`] on malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_timer(mut self, timer: TimerOptions) -> Self {
        self.timer = timer;
        self
    }

    #[must_use]
    pub fn with_assets(mut self, assets: AssetOptions) -> Self {
        self.assets = assets;
        self
    }

    #[must_use]
    pub fn with_net(mut self, net: NetOptions) -> Self {
        self.net = net;
        self
    }
}
