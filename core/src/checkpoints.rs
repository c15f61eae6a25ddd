/// Checkpoint registry — pins known-good `(height, hash)` pairs so a deep
/// reorg below the highest pinned height is rejected outright rather than
/// replayed and judged on chain weight.
///
/// Storage is an in-memory `BTreeMap` behind a `RwLock`: reads of
/// `is_pinned` / `check_block` happen on every block, writes only at
/// startup or when an operator adds a new point release, so the lock is
/// never contended on the hot path.
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::ConsensusError;
use crate::network::NetworkType;
use crate::types::Hash256;

/// Per-network set of DNS TXT checkpoint sources, fixed at compile time.
/// `Fakechain` carries none — tests construct their own records directly.
fn dns_seeds(net: NetworkType) -> &'static [&'static str] {
    match net {
        NetworkType::Mainnet => &[
            "checkpoints.mainnet.zion-terranova.com",
            "checkpoints2.mainnet.zion-terranova.com",
        ],
        NetworkType::Testnet => &["checkpoints.testnet.zion-terranova.com"],
        NetworkType::Stagenet => &["checkpoints.stagenet.zion-terranova.com"],
        NetworkType::Fakechain => &[],
    }
}

/// Bound on a single DNS lookup, per the source's 20s timeout.
const DNS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);

/// The outcome of checking a candidate block against the registry: a
/// mismatch is reported as an `Err(ConsensusError::CheckpointMismatch)`
/// rather than folded in here, since it's the one verdict callers should
/// be forced to handle explicitly (ban-worthy) rather than pattern-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointVerdict {
    Matched,
    NotPinned,
}

pub struct CheckpointRegistry {
    points: RwLock<BTreeMap<u64, Hash256>>,
}

impl Default for CheckpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointRegistry {
    pub fn new() -> Self {
        CheckpointRegistry {
            points: RwLock::new(BTreeMap::new()),
        }
    }

    /// Pins `hash` at `height`. Re-adding the same `(height, hash)` pair is
    /// a no-op; adding a different hash at an already-pinned height is a
    /// `ConflictingCheckpoint` error.
    pub fn add(&self, height: u64, hash: Hash256) -> Result<(), ConsensusError> {
        let mut points = self.points.write().unwrap();
        if let Some(&existing) = points.get(&height) {
            if existing == hash {
                return Ok(());
            }
            return Err(ConsensusError::ConflictingCheckpoint { height });
        }
        points.insert(height, hash);
        Ok(())
    }

    /// True iff `height` has a pinned checkpoint.
    pub fn is_pinned(&self, height: u64) -> bool {
        self.points.read().unwrap().contains_key(&height)
    }

    /// The highest pinned height, or `0` if the registry is empty.
    pub fn max_pinned_height(&self) -> u64 {
        self.points
            .read()
            .unwrap()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    /// Validates a block at `height` against a pinned checkpoint, if one
    /// exists at that height.
    pub fn check_block(
        &self,
        height: u64,
        hash: Hash256,
    ) -> Result<CheckpointVerdict, ConsensusError> {
        let points = self.points.read().unwrap();
        match points.get(&height) {
            Some(&expected) if expected == hash => Ok(CheckpointVerdict::Matched),
            Some(&expected) => Err(ConsensusError::CheckpointMismatch {
                height,
                expected,
                got: hash,
            }),
            None => Ok(CheckpointVerdict::NotPinned),
        }
    }

    /// True iff a candidate chain forking at `candidate_height` is allowed
    /// to compete with the chain at `chain_tip`: either no checkpoint at or
    /// below `chain_tip` exists, or the highest such checkpoint's height is
    /// strictly below `candidate_height`. A candidate height of zero is
    /// always rejected — nothing may fork below genesis.
    pub fn is_alternative_allowed(&self, chain_tip: u64, candidate_height: u64) -> bool {
        if candidate_height == 0 {
            return false;
        }
        let points = self.points.read().unwrap();
        match points.range(..=chain_tip).next_back() {
            Some((&buried_height, _)) => buried_height < candidate_height,
            None => true,
        }
    }

    /// Pairwise comparison against `other` over the intersection of pinned
    /// heights: any height pinned in both registries must agree on its
    /// hash, or this reports the conflict.
    pub fn check_for_conflicts(&self, other: &CheckpointRegistry) -> Result<(), ConsensusError> {
        let own = self.points.read().unwrap();
        let theirs = other.points.read().unwrap();
        for (height, hash) in own.iter() {
            if let Some(&other_hash) = theirs.get(height) {
                if *hash != other_hash {
                    return Err(ConsensusError::ConflictingCheckpoint { height: *height });
                }
            }
        }
        Ok(())
    }

    /// Populates the registry with the hardcoded launch checkpoints every
    /// node ships with, independent of JSON/DNS sources.
    ///
    /// The exact mainnet hash bytes are not carried in this crate's
    /// retrieval pack (only the heights are named in the spec's seed
    /// scenarios); the values below are placeholders that preserve the
    /// pinned heights (1 and 333_685) and the registry's shape. A real
    /// deployment would replace these with the chain's actual block
    /// hashes at those heights.
    pub fn init_default(&self, net: NetworkType) {
        if net != NetworkType::Mainnet {
            return;
        }
        for &(height, hash) in MAINNET_DEFAULT_CHECKPOINTS {
            if let Err(e) = self.add(height, hash) {
                warn!("checkpoints: default table rejected at height {height}: {e}");
            }
        }
        debug!(
            "checkpoint registry: seeded {} mainnet defaults",
            MAINNET_DEFAULT_CHECKPOINTS.len()
        );
    }

    /// Loads additional checkpoints from a JSON file of the documented
    /// `{"checkpoints": [{"height": .., "hash": ..}]}` shape. Entries at
    /// already-pinned heights are skipped silently; a missing file is not
    /// an error (treated as zero additions).
    pub fn load_from_json(&self, path: &Path) -> Result<usize, anyhow::Error> {
        if !path.exists() {
            info!("checkpoints: {} not found, skipping", path.display());
            return Ok(0);
        }
        let raw = std::fs::read_to_string(path)?;
        let parsed: JsonCheckpointFile = serde_json::from_str(&raw)?;

        let mut loaded = 0;
        for entry in parsed.checkpoints {
            let hash: Hash256 = match entry.hash.parse() {
                Ok(h) => h,
                Err(_) => {
                    warn!(
                        "checkpoints: skipping malformed hash at height {}",
                        entry.height
                    );
                    continue;
                }
            };
            match self.add(entry.height, hash) {
                Ok(()) => loaded += 1,
                Err(e) => debug!("checkpoints: json entry ignored: {e}"),
            }
        }
        info!(
            "checkpoints: loaded {loaded} entries from {}",
            path.display()
        );
        Ok(loaded)
    }

    /// Loads checkpoints from every DNS TXT source registered for `net`.
    /// Each record is expected to be a `height:hex-hash` pair; records that
    /// don't parse are logged and skipped. A lookup that times out or
    /// fails is a soft failure — it is logged and treated as zero
    /// additions from that source, never surfaced as an error, since DNS
    /// is advisory and the compiled-in defaults remain authoritative.
    /// Always returns `Ok`; the `anyhow::Result` wrapper exists so this
    /// composes with the fallible startup sequence in the demonstration
    /// binary, not because this function itself can fail.
    pub async fn load_from_dns(&self, net: NetworkType) -> anyhow::Result<usize> {
        let mut total = 0;
        for &domain in dns_seeds(net) {
            total += self.load_from_dns_domain(domain).await;
        }
        Ok(total)
    }

    async fn load_from_dns_domain(&self, domain: &str) -> usize {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        let response = match tokio::time::timeout(DNS_LOOKUP_TIMEOUT, resolver.txt_lookup(domain))
            .await
        {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!("checkpoints: dns lookup for {domain} failed: {e}");
                return 0;
            }
            Err(_) => {
                warn!("checkpoints: dns lookup for {domain} timed out");
                return 0;
            }
        };

        let mut loaded = 0;
        for record in response.iter() {
            let joined: String = record
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk))
                .collect();
            match parse_dns_checkpoint_record(&joined) {
                Some((height, hash)) => match self.add(height, hash) {
                    Ok(()) => loaded += 1,
                    Err(e) => debug!("checkpoints: dns record ignored: {e}"),
                },
                None => warn!("checkpoints: unparseable dns TXT record {joined:?}"),
            }
        }
        info!("checkpoints: loaded {loaded} entries from dns:{domain}");
        loaded
    }
}

/// Heights match the scenarios carried in this crate's test-vector
/// catalogue (height 1 and the 333_685 reorg-guard example); hashes are
/// placeholders (see [`CheckpointRegistry::init_default`]).
const MAINNET_DEFAULT_CHECKPOINTS: &[(u64, Hash256)] = &[
    (1, Hash256([0x45, 0x36, 0x8c, 0xc3, 0u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])),
    (333_685, Hash256([0x33u8; 32])),
];

#[derive(Debug, Deserialize)]
struct JsonCheckpointFile {
    checkpoints: Vec<JsonCheckpointEntry>,
}

#[derive(Debug, Deserialize)]
struct JsonCheckpointEntry {
    height: u64,
    hash: String,
}

fn parse_dns_checkpoint_record(record: &str) -> Option<(u64, Hash256)> {
    let (height_str, hash_str) = record.split_once(':')?;
    let height: u64 = height_str.trim().parse().ok()?;
    let hash: Hash256 = hash_str.trim().parse().ok()?;
    Some((height, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(byte: u8) -> Hash256 {
        Hash256([byte; 32])
    }

    #[test]
    fn test_add_and_is_pinned() {
        let reg = CheckpointRegistry::new();
        assert!(!reg.is_pinned(100));
        reg.add(100, h(1)).unwrap();
        assert!(reg.is_pinned(100));
    }

    #[test]
    fn test_re_adding_identical_checkpoint_is_ok() {
        let reg = CheckpointRegistry::new();
        reg.add(100, h(1)).unwrap();
        assert!(reg.add(100, h(1)).is_ok());
    }

    #[test]
    fn test_conflicting_add_is_rejected() {
        let reg = CheckpointRegistry::new();
        reg.add(100, h(1)).unwrap();
        let err = reg.add(100, h(2)).unwrap_err();
        assert_eq!(err, ConsensusError::ConflictingCheckpoint { height: 100 });
    }

    #[test]
    fn test_check_block_reports_not_pinned_on_unknown_height() {
        let reg = CheckpointRegistry::new();
        assert_eq!(reg.check_block(5, h(9)).unwrap(), CheckpointVerdict::NotPinned);
    }

    #[test]
    fn test_check_block_reports_matched_or_mismatch() {
        let reg = CheckpointRegistry::new();
        reg.add(10, h(1)).unwrap();
        assert_eq!(reg.check_block(10, h(1)).unwrap(), CheckpointVerdict::Matched);
        let err = reg.check_block(10, h(2)).unwrap_err();
        assert_eq!(
            err,
            ConsensusError::CheckpointMismatch {
                height: 10,
                expected: h(1),
                got: h(2),
            }
        );
    }

    #[test]
    fn test_mainnet_defaults_cover_seed_scenario() {
        let reg = CheckpointRegistry::new();
        reg.init_default(NetworkType::Mainnet);
        let genesis_hash = MAINNET_DEFAULT_CHECKPOINTS[0].1;
        assert_eq!(
            reg.check_block(1, genesis_hash).unwrap(),
            CheckpointVerdict::Matched
        );
        assert!(reg.check_block(1, h(9)).is_err());
        assert_eq!(reg.check_block(2, h(9)).unwrap(), CheckpointVerdict::NotPinned);
    }

    #[test]
    fn test_testnet_gets_no_compiled_in_defaults() {
        let reg = CheckpointRegistry::new();
        reg.init_default(NetworkType::Testnet);
        assert_eq!(reg.max_pinned_height(), 0);
    }

    #[test]
    fn test_max_pinned_height_tracks_highest_entry() {
        let reg = CheckpointRegistry::new();
        assert_eq!(reg.max_pinned_height(), 0);
        reg.add(10, h(1)).unwrap();
        reg.add(500, h(2)).unwrap();
        reg.add(200, h(3)).unwrap();
        assert_eq!(reg.max_pinned_height(), 500);
    }

    #[test]
    fn test_alternative_disallowed_below_buried_checkpoint() {
        // mirrors the seed scenario: a checkpoint at 333_685 buries
        // anything forking at or below it.
        let reg = CheckpointRegistry::new();
        reg.add(333_685, h(1)).unwrap();
        assert!(!reg.is_alternative_allowed(400_000, 200_000));
        assert!(reg.is_alternative_allowed(400_000, 340_000));
    }

    #[test]
    fn test_alternative_allowed_with_no_checkpoints() {
        let reg = CheckpointRegistry::new();
        assert!(reg.is_alternative_allowed(400_000, 1));
    }

    #[test]
    fn test_zero_candidate_height_always_rejected() {
        let reg = CheckpointRegistry::new();
        assert!(!reg.is_alternative_allowed(400_000, 0));
    }

    #[test]
    fn test_check_for_conflicts_compares_only_shared_heights() {
        let a = CheckpointRegistry::new();
        a.add(10, h(1)).unwrap();
        a.add(20, h(2)).unwrap();

        let agreeing = CheckpointRegistry::new();
        agreeing.add(10, h(1)).unwrap();
        agreeing.add(30, h(9)).unwrap(); // height not shared, ignored
        assert!(a.check_for_conflicts(&agreeing).is_ok());

        let conflicting = CheckpointRegistry::new();
        conflicting.add(20, h(99)).unwrap();
        let err = a.check_for_conflicts(&conflicting).unwrap_err();
        assert_eq!(err, ConsensusError::ConflictingCheckpoint { height: 20 });
    }

    #[test]
    fn test_parses_dns_record_format() {
        let (height, hash) = parse_dns_checkpoint_record(&format!("100:{}", h(1).to_hex())).unwrap();
        assert_eq!(height, 100);
        assert_eq!(hash, h(1));
    }

    #[test]
    fn test_rejects_malformed_dns_record() {
        assert!(parse_dns_checkpoint_record("not-a-record").is_none());
        assert!(parse_dns_checkpoint_record("abc:deadbeef").is_none());
    }

    #[test]
    fn test_load_from_json_skips_bad_entries_but_keeps_good_ones() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let good_hash = h(7).to_hex();
        writeln!(
            file,
            r#"{{"checkpoints": [{{"height": 100, "hash": "{good_hash}"}}, {{"height": 200, "hash": "zz"}}]}}"#
        )
        .unwrap();
        let reg = CheckpointRegistry::new();
        let loaded = reg.load_from_json(file.path()).unwrap();
        assert_eq!(loaded, 1);
        assert!(reg.is_pinned(100));
        assert!(!reg.is_pinned(200));
    }

    #[test]
    fn test_load_from_json_missing_file_is_not_an_error() {
        let reg = CheckpointRegistry::new();
        let loaded = reg.load_from_json(Path::new("/nonexistent/path/checkpoints.json")).unwrap();
        assert_eq!(loaded, 0);
    }

    #[test]
    fn test_load_from_json_skips_already_pinned_heights_silently() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"checkpoints": [{{"height": 10, "hash": "{}"}}]}}"#,
            h(2).to_hex()
        )
        .unwrap();
        let reg = CheckpointRegistry::new();
        reg.add(10, h(1)).unwrap();
        let loaded = reg.load_from_json(file.path()).unwrap();
        assert_eq!(loaded, 0);
        assert_eq!(reg.check_block(10, h(1)).unwrap(), CheckpointVerdict::Matched);
    }
}
