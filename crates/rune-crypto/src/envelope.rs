use aes::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;
use crate::key::SecretKey;

/// Length of the random nonce prepended to every sealed payload.
pub const NONCE_LEN: usize = 16;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Symmetric sealing envelope: AES-256-CTR with a fresh nonce per seal.
///
/// Output layout is `nonce (16 bytes) || ciphertext`, with no header, length
/// prefix, or magic bytes.
///
/// The envelope is **not authenticated**. A flipped ciphertext bit flips the
/// same plaintext bit and a wrong key yields garbage; neither is reported
/// here. Callers that decode the plaintext find out when decoding fails.
#[derive(Clone, Debug)]
pub struct Envelope {
    key: SecretKey,
}

impl Envelope {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` under a freshly generated nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut out = Vec::with_capacity(NONCE_LEN + plaintext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(plaintext);
        self.apply_keystream(&nonce, &mut out[NONCE_LEN..]);
        out
    }

    /// Decrypt a payload produced by [`seal`](Self::seal).
    ///
    /// Fails only if `sealed` cannot hold a nonce.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_LEN {
            return Err(CryptoError::PayloadTooShort {
                len: sealed.len(),
                min: NONCE_LEN,
            });
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let mut nonce_arr = [0u8; NONCE_LEN];
        nonce_arr.copy_from_slice(nonce);

        let mut plaintext = ciphertext.to_vec();
        self.apply_keystream(&nonce_arr, &mut plaintext);
        Ok(plaintext)
    }

    /// The key this envelope seals with.
    pub fn key(&self) -> &SecretKey {
        &self.key
    }

    fn apply_keystream(&self, nonce: &[u8; NONCE_LEN], buf: &mut [u8]) {
        let mut cipher = Aes256Ctr::new(self.key.as_bytes().into(), nonce.into());
        cipher.apply_keystream(buf);
    }
}
