//! Canonical encoding and content hashing
//!
//! Serialization is compact JSON over structs with fixed field order and no
//! hash maps anywhere in the snapshot path, so encoding the same logical
//! snapshot twice yields byte-identical output. That determinism is what
//! makes the content checksum stable.
//!
//! The checksum is a sha256 digest over the canonical encoding of the
//! snapshot with its own `metadata.checksum` field cleared. Verification
//! recomputes and compares; a mismatch is corruption and is never silently
//! accepted.

use crate::error::{BackupError, BackupResult};
use crate::snapshot::Snapshot;
use sha2::{Digest, Sha256};

/// Encode a snapshot to its canonical byte form
pub fn serialize(snapshot: &Snapshot) -> BackupResult<Vec<u8>> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Decode a snapshot from bytes
///
/// Unknown fields are ignored (forward compatibility); missing required
/// fields — ids, foreign keys, whole table sections — are hard errors.
pub fn deserialize(bytes: &[u8]) -> BackupResult<Snapshot> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Compute the content checksum of a snapshot
///
/// The digest covers the canonical encoding with `metadata.checksum` cleared,
/// so the stored checksum never feeds into itself.
pub fn checksum(snapshot: &Snapshot) -> BackupResult<String> {
    let mut cleared = snapshot.clone();
    cleared.metadata.checksum.clear();
    let bytes = serialize(&cleared)?;
    Ok(sha256_hex(&bytes))
}

/// Recompute the checksum and compare against an expected digest
pub fn verify(snapshot: &Snapshot, expected: &str) -> BackupResult<bool> {
    Ok(checksum(snapshot)? == expected)
}

/// Verify a snapshot against the checksum stored in its own metadata
///
/// Returns `ChecksumMismatch` carrying both digests on any difference.
pub fn verify_stored(snapshot: &Snapshot) -> BackupResult<()> {
    let actual = checksum(snapshot)?;
    if actual != snapshot.metadata.checksum {
        return Err(BackupError::ChecksumMismatch {
            expected: snapshot.metadata.checksum.clone(),
            actual,
        });
    }
    Ok(())
}

/// Compute sha256 of data and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
