//! Cache keys for simulation results.
//!
//! A key covers the full immutable input: the Touchstone content and the
//! simulation parameters. Identical requests map to the same key.

use crate::error::ComResult;
use crate::params::SimulationParameters;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Serialize)]
struct Payload<'a> {
    content_hash: String,
    parameters: &'a SimulationParameters,
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    format!("{:x}", hasher.finalize())
}

/// Deterministic fingerprint over the content hash and the canonical JSON of
/// `params`.
pub fn simulation_fingerprint(
    content: impl AsRef<[u8]>,
    params: &SimulationParameters,
) -> ComResult<String> {
    let payload = Payload {
        content_hash: sha256_hex(content),
        parameters: params,
    };
    let serialized = serde_json::to_vec(&payload)?;
    Ok(sha256_hex(serialized))
}
