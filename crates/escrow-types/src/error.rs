use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("record buffer too short: expected at least {expected} bytes, got {actual}")]
    Undersized { expected: usize, actual: usize },

    #[error("record amount must be at least 1")]
    ZeroAmount,
}

/// Decode a 32-byte value from hex, tolerating an optional text prefix.
pub(crate) fn decode_hex32(s: &str, prefix: &str) -> Result<[u8; 32], TypeError> {
    let s = s.trim();
    let s = s.strip_prefix(prefix).unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
