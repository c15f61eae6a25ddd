/// Shared value types for the consensus arithmetic layer.
///
/// `Hash256` and `Difficulty` are thin newtypes rather than bare `[u8; 32]`
/// / `u64` so the little-endian-limb interpretation `check_hash` relies on
/// can't be accidentally bypassed by treating a hash as a big-endian
/// byte string somewhere upstream.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 32-byte block hash, compared byte-exact and interpreted as four
/// little-endian 64-bit limbs for proof-of-work checking.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// The four little-endian 64-bit limbs, least-significant first.
    pub fn limbs_le(&self) -> [u64; 4] {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&self.0[i * 8..i * 8 + 8]);
            *limb = u64::from_le_bytes(bytes);
        }
        limbs
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

/// Parse error for `Hash256::from_str` / checkpoint loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex hash")]
pub struct InvalidHexHash;

impl FromStr for Hash256 {
    type Err = InvalidHexHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| InvalidHexHash)?;
        if bytes.len() != 32 {
            return Err(InvalidHexHash);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash256(arr))
    }
}
