//! Cryptographic primitives for the Rune store.
//!
//! Provides secret-to-key derivation (SHA-256) and the sealing [`Envelope`]
//! (AES-256-CTR with a random 128-bit nonce) shared by store files and
//! packaged artifacts.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.
//! The envelope deliberately carries no authentication tag; see [`Envelope`].

pub mod envelope;
pub mod error;
pub mod key;

pub use envelope::{Envelope, NONCE_LEN};
pub use error::CryptoError;
pub use key::{derive_key, SecretKey, KEY_LEN};
