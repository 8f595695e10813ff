#![forbid(unsafe_code)]

//! # quark-assets
//!
//! Reference-counted bundle cache for the quark runtime.
//!
//! ## Lifecycle
//!
//! A cached bundle is `Loading`, `Loaded` or `Retained`; a bundle not in the cache is unloaded.
//!
//! - An async asset request resolves the owning bundle through the manifest and reserves its
//!   whole dependency closure. Absent bundles get one download task each; requests for a bundle
//!   that is already loading share that download.
//! - The callback runs once every bundle of the closure is `Loaded`.
//! - Dropping the last reference moves a bundle to `Retained` and starts a retain timer. A
//!   request inside the window revives the same decoded bundle; otherwise the timer unloads it.
//! - [`AssetProvider::unload_unused_assets`] skips the window, one dependency layer per pass.
//!
//! ## Threading
//!
//! Everything runs on the tick thread. Network completions reach the provider through
//! [`quark_net::PendingFetch`] polled by the download task.

mod asset;
mod decoder;
mod error;
mod options;
mod provider;
mod source;
mod stats;

pub use asset::{AssetRef, FromAsset, Instance, LoadedBundle};
pub use decoder::{ArchiveDecoder, BundleDecoder};
pub use error::{AssetsError, AssetsResult};
pub use options::{AssetOptions, DEFAULT_RETAIN_TIME};
pub use provider::{AssetProvider, AssetProviderBuilder};
pub use source::{AssetSource, FsAssetSource, NoAssetSource};
pub use stats::{BundleStage, ProviderStats};
