use tracing::{debug, error};

use crate::{
    cipher::ManifestCipher,
    error::{ManifestError, ManifestResult},
    pack::VersionPackInfo,
    simplify::SimplifiedPack,
};

impl VersionPackInfo {
    /// Serializes the path-compressed manifest as JSON, encrypted when a cipher is given.
    ///
    /// # Errors
    ///
    /// Fails when paths cannot be simplified (a dependency outside the pack).
    pub fn to_binary_data(&self, cipher: Option<&ManifestCipher>) -> ManifestResult<Vec<u8>> {
        let json = serde_json::to_vec(&self.simplify_path()?)?;
        Ok(match cipher {
            Some(cipher) => cipher.encrypt(&json),
            None => json,
        })
    }

    /// Decodes and initializes a manifest.
    ///
    /// # Errors
    ///
    /// [`ManifestError::Decrypt`], [`ManifestError::Json`], [`ManifestError::MissingVersion`] or
    /// a path restoration error.
    pub fn try_from_binary_data(
        data: &[u8],
        cipher: Option<&ManifestCipher>,
    ) -> ManifestResult<Self> {
        let plain;
        let json = match cipher {
            Some(cipher) => {
                plain = cipher.decrypt(data)?;
                plain.as_slice()
            }
            None => data,
        };
        let simplified: SimplifiedPack = serde_json::from_slice(json)?;
        if simplified.version.is_empty() {
            return Err(ManifestError::MissingVersion);
        }
        let pack = simplified.restore_path()?;
        debug!(version = %pack.version, bundles = pack.bundle_count(), "manifest decoded");
        Ok(pack)
    }

    /// Like [`Self::try_from_binary_data`], but reports failure through the
    /// [`VersionPackInfo::invalid`] sentinel.
    pub fn from_binary_data(data: &[u8], cipher: Option<&ManifestCipher>) -> Self {
        Self::try_from_binary_data(data, cipher).unwrap_or_else(|error| {
            error!(%error, len = data.len(), "manifest decode failed");
            Self::invalid()
        })
    }
}
