use std::fs;
use std::path::{Path, PathBuf};

use rune_crypto::{Envelope, SecretKey};
use tracing::debug;

use crate::error::{PackError, PackResult};

/// Conventional extension of packaged artifacts.
pub const ARTIFACT_EXT: &str = "qrew";

/// Seal a raw payload under a key derived from `secret`.
///
/// The artifact is `nonce || ciphertext` with no header or framing.
pub fn pack(payload: &[u8], secret: &str) -> Vec<u8> {
    envelope(secret).seal(payload)
}

/// Open an artifact produced by [`pack`] with the same secret.
///
/// The envelope is unauthenticated: a wrong secret or a damaged artifact
/// usually yields garbage rather than an error. Only artifacts too short to
/// carry a nonce fail.
pub fn unpack(artifact: &[u8], secret: &str) -> PackResult<Vec<u8>> {
    envelope(secret)
        .open(artifact)
        .map_err(|_| PackError::Decrypt)
}

/// Pack the file at `src` and write the artifact to `dest`.
pub fn pack_file(src: &Path, dest: &Path, secret: &str) -> PackResult<()> {
    let payload = fs::read(src)?;
    let artifact = pack(&payload, secret);
    fs::write(dest, &artifact)?;
    debug!(
        src = %src.display(),
        dest = %dest.display(),
        len = artifact.len(),
        "artifact packed"
    );
    Ok(())
}

/// Read and unpack the artifact at `src`.
pub fn unpack_file(src: &Path, secret: &str) -> PackResult<Vec<u8>> {
    let artifact = fs::read(src)?;
    let payload = unpack(&artifact, secret)?;
    debug!(src = %src.display(), len = payload.len(), "artifact unpacked");
    Ok(payload)
}

/// Where the artifact for a source file goes: same path, `.qrew` extension.
pub fn artifact_path(source: &Path) -> PathBuf {
    source.with_extension(ARTIFACT_EXT)
}

fn envelope(secret: &str) -> Envelope {
    Envelope::new(SecretKey::from_secret(secret))
}
