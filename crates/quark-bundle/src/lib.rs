#![forbid(unsafe_code)]

//! Bundle manifest (`VersionPackInfo`) and related formats.
//!
//! A manifest lists every deployable bundle with the assets it contains and the bundles it
//! depends on. On the wire the manifest is path-compressed ([`SimplifiedPack`]): asset paths
//! are stored relative to their bundle directory and dependencies as bundle ids. The payload
//! can additionally be AES-128-CBC encrypted with a [`ManifestCipher`].

mod archive;
mod cipher;
mod codec;
mod error;
mod info;
mod pack;
mod path;
mod simplify;

pub use crate::{
    archive::{BundleArchive, MAX_ARCHIVE_BYTES},
    cipher::ManifestCipher,
    error::{ManifestError, ManifestResult},
    info::BundleInfo,
    pack::VersionPackInfo,
    path::{flatten_bundle_name, hash_bytes, hash_qualified, normalize_path},
    simplify::{SimplifiedBundle, SimplifiedPack},
};

/// File name of the manifest next to the bundles.
pub const MANIFEST_NAME: &str = "bundle_pack";
