//! Packaging format for Rune.
//!
//! Wraps arbitrary source payloads into encrypted artifacts using the same
//! envelope the store seals its files with. An artifact has no internal
//! structure: it is the 16-byte nonce followed by the AES-256-CTR ciphertext
//! of the payload, keyed by SHA-256 of a shared secret (typically the
//! application package name).
//!
//! - [`pack`] / [`unpack`] -- in-memory payloads
//! - [`pack_file`] / [`unpack_file`] -- payloads on disk
//! - [`artifact_path`] -- `.qrew` path for a source file

pub mod artifact;
pub mod error;

pub use artifact::{artifact_path, pack, pack_file, unpack, unpack_file, ARTIFACT_EXT};
pub use error::{PackError, PackResult};
