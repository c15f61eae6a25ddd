/// Consensus-surfacing error kinds.
///
/// `ArithmeticOverflow` from difficulty v2/v4 is deliberately *not* a
/// variant here — those are in-band sentinel return values (1 or 0), not
/// recoverable errors, and folding them into this enum would invite a
/// future maintainer to "fix" behaviour that is itself the consensus rule.
/// Likewise `InvalidHexHash` / `InvalidDnsRecord` / `JsonFileMissing` never
/// reach the caller — they are logged and swallowed where they occur.
use crate::Hash256;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("checkpoint conflict at height {height}: already pinned to a different hash")]
    ConflictingCheckpoint { height: u64 },

    #[error("checkpoint mismatch at height {height}: expected {expected}, got {got}")]
    CheckpointMismatch {
        height: u64,
        expected: Hash256,
        got: Hash256,
    },

    #[error("block too large: current size {current} exceeds 2x effective median {median}")]
    BlockTooLarge { current: u64, median: u64 },
}
