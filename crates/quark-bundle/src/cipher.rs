use aes::Aes128;
use cbc::{
    Decryptor, Encryptor,
    cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ManifestError, ManifestResult};

/// AES-128-CBC key material for manifest payloads.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCipher {
    pub key: [u8; 16],
    pub iv: [u8; 16],
}

impl ManifestCipher {
    pub fn new(key: [u8; 16], iv: [u8; 16]) -> Self {
        Self { key, iv }
    }

    /// Derives key and IV from the SHA-256 of a build-time passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 16];
        let mut iv = [0u8; 16];
        key.copy_from_slice(&digest[..16]);
        iv.copy_from_slice(&digest[16..]);
        Self { key, iv }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        Encryptor::<Aes128>::new((&self.key).into(), (&self.iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// # Errors
    ///
    /// [`ManifestError::Decrypt`] for misaligned input or bad padding (wrong key).
    pub fn decrypt(&self, ciphertext: &[u8]) -> ManifestResult<Vec<u8>> {
        Decryptor::<Aes128>::new((&self.key).into(), (&self.iv).into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| ManifestError::Decrypt(e.to_string()))
    }
}

impl std::fmt::Debug for ManifestCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestCipher").finish_non_exhaustive()
    }
}
