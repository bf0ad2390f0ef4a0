//! Serializer + envelope: the on-disk form of every store file.
//!
//! File bytes are `seal(msgpack(contents))`. Structs are encoded as maps with
//! field names so that files stay readable by other MessagePack tooling.

use rune_crypto::Envelope;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// Encode a value to MessagePack without sealing it.
pub fn to_msgpack<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a MessagePack payload.
///
/// `file` only labels the error: a payload that fails to decode is reported
/// as [`StoreError::Decrypt`], since after a wrong key or tampering that is
/// where the damage shows.
pub fn from_msgpack<T: DeserializeOwned>(file: &str, bytes: &[u8]) -> StoreResult<T> {
    rmp_serde::from_slice(bytes).map_err(|e| StoreError::Decrypt {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

/// Seals and opens whole store files.
#[derive(Clone, Debug)]
pub struct SealedCodec {
    envelope: Envelope,
}

impl SealedCodec {
    pub fn new(envelope: Envelope) -> Self {
        Self { envelope }
    }

    /// Serialize then seal.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StoreResult<Vec<u8>> {
        Ok(self.envelope.seal(&to_msgpack(value)?))
    }

    /// Open then deserialize.
    pub fn decode<T: DeserializeOwned>(&self, file: &str, sealed: &[u8]) -> StoreResult<T> {
        let plaintext = self.envelope.open(sealed).map_err(|e| StoreError::Decrypt {
            file: file.to_string(),
            reason: e.to_string(),
        })?;
        from_msgpack(file, &plaintext)
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
