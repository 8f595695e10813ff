use bytes::Bytes;
use quark_bundle::{BundleArchive, BundleInfo, hash_bytes};
use tracing::trace;

use crate::{
    asset::LoadedBundle,
    error::{AssetsError, AssetsResult},
};

/// Turns a fetched bundle blob into its assets.
pub trait BundleDecoder {
    fn decode(&self, bundle: &BundleInfo, data: Bytes) -> AssetsResult<LoadedBundle>;
}

/// Decodes [`BundleArchive`] blobs, optionally checking the manifest content hash first.
#[derive(Clone, Copy, Debug)]
pub struct ArchiveDecoder {
    verify_hash: bool,
}

impl ArchiveDecoder {
    pub fn new(verify_hash: bool) -> Self {
        Self { verify_hash }
    }
}

impl Default for ArchiveDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BundleDecoder for ArchiveDecoder {
    fn decode(&self, bundle: &BundleInfo, data: Bytes) -> AssetsResult<LoadedBundle> {
        if self.verify_hash && !bundle.hash.is_empty() {
            let actual = hash_bytes(&data);
            if actual != bundle.hash {
                return Err(AssetsError::Parse(format!(
                    "hash mismatch for {}: expected {}, got {actual}",
                    bundle.bundle_path, bundle.hash
                )));
            }
        }

        let archive = BundleArchive::decode(&data)?;
        let assets = archive
            .into_entries()
            .map(|(path, bytes)| (path, Bytes::from(bytes)))
            .collect();
        let loaded = LoadedBundle::new(bundle.bundle_path.clone(), assets);
        trace!(bundle = %bundle.bundle_path, assets = loaded.asset_count(), "bundle decoded");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn blob() -> Bytes {
        let archive = BundleArchive::new().with_entry("ui/a.txt", b"alpha".to_vec());
        Bytes::from(archive.encode().unwrap())
    }

    fn info(hash: &str) -> BundleInfo {
        BundleInfo::new(1, "ui.bundle", ["ui/a.txt"], [] as [&str; 0]).with_hash(hash)
    }

    #[rstest]
    fn decodes_without_hash(blob: Bytes) {
        let loaded = ArchiveDecoder::default().decode(&info(""), blob).unwrap();
        assert_eq!(loaded.path(), "ui.bundle");
        assert_eq!(loaded.get("ui/a.txt").as_deref(), Some(&b"alpha"[..]));
    }

    #[rstest]
    fn accepts_matching_hash(blob: Bytes) {
        let hash = hash_bytes(&blob);
        assert!(ArchiveDecoder::default().decode(&info(&hash), blob).is_ok());
    }

    #[rstest]
    #[case::verified(true, true)]
    #[case::unverified(false, false)]
    fn hash_mismatch(blob: Bytes, #[case] verify: bool, #[case] rejected: bool) {
        let result = ArchiveDecoder::new(verify).decode(&info("deadbeef"), blob);
        assert_eq!(matches!(result, Err(AssetsError::Parse(_))), rejected);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = ArchiveDecoder::default().decode(&info(""), Bytes::from_static(b"\xff\xff\xff"));
        assert!(matches!(result, Err(AssetsError::Parse(_))));
    }
}
