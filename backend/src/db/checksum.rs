//! Checksum calculation for dataset deduplication.

use sha2::{Digest, Sha256};

/// SHA-256 of uploaded table content, as lowercase hex.
///
/// The content is hashed as received, so re-uploading the same file yields
/// the same checksum while any edit, including whitespace, yields a new one.
pub fn calculate_checksum(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    hex::encode(hasher.finalize())
}
