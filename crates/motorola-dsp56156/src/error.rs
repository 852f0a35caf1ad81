//! Errors returned to the host.

use thiserror::Error;

/// Failure to decode or encode a saved DSP state.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("not a DSP56156 state blob")]
    BadMagic,
    #[error("unsupported state version {0}")]
    UnsupportedVersion(u16),
    #[error("state decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("state encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}
