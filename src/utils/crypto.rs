use ring::digest::{Context, SHA256};

use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in whole seconds.
pub fn current_timestamp() -> Result<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LedgerError::Config(format!("System time error: {e}")))?;
    Ok(duration.as_secs())
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// Lowercase hex of the SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha256_digest(data))
}

/// Decode a hex digest, accepting either case.
pub fn hex_decode(digest: &str) -> Result<Vec<u8>> {
    HEXLOWER
        .decode(digest.to_ascii_lowercase().as_bytes())
        .map_err(|e| LedgerError::Serialization(format!("Invalid hex digest {digest:?}: {e}")))
}

/// Random 32-bit value used to diversify otherwise identical transactions.
pub fn random_nonce() -> u64 {
    u64::from(rand::thread_rng().gen::<u32>())
}
