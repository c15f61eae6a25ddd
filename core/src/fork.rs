/// Fork schedule — the compile-time map from `(network, height)` to a
/// consensus protocol version.
///
/// Every other component (difficulty algorithm selection, emission curve,
/// full-reward-zone size) is driven from the version this module returns;
/// nothing downstream should hard-code a height comparison of its own.
use crate::network::NetworkType;

/// Highest defined protocol version.
pub const MAX_VERSION: u8 = 23;

/// A `(version, activation_height)` row in a fork schedule. Schedules must
/// be sorted ascending by `height` and `version` must increase
/// monotonically (enforced only by construction, not at runtime — these
/// are compile-time tables).
#[derive(Debug, Clone, Copy)]
struct ForkRow {
    version: u8,
    height: u64,
}

const MAINNET_SCHEDULE: &[ForkRow] = &[
    ForkRow { version: 1, height: 0 },
    ForkRow { version: 7, height: 307_003 },
    ForkRow { version: 8, height: 307_054 },
    ForkRow { version: 9, height: 308_110 },
    ForkRow { version: 10, height: 310_790 },
    ForkRow { version: 11, height: 310_860 },
    ForkRow { version: 12, height: 333_690 },
    ForkRow { version: 13, height: 337_496 },
    ForkRow { version: 14, height: 337_816 },
    ForkRow { version: 15, height: 337_838 },
    ForkRow { version: 16, height: 500_060 },
    ForkRow { version: 17, height: 570_000 },
    ForkRow { version: 18, height: 659_000 },
    ForkRow { version: 19, height: 739_800 },
    ForkRow { version: 20, height: 1_132_596 },
    ForkRow { version: 21, height: 1_132_900 },
    ForkRow { version: 22, height: 1_132_935 },
    ForkRow { version: 23, height: 1_183_409 },
];

/// Versions 2..6 never separately activated on mainnet (the early chain
/// jumps straight from v1 to v7); they are reachable on testnet/stagenet
/// below so every algorithm branch has a short-chain fixture.
const TESTNET_SCHEDULE: &[ForkRow] = &[
    ForkRow { version: 1, height: 0 },
    ForkRow { version: 2, height: 2 },
    ForkRow { version: 3, height: 3 },
    ForkRow { version: 4, height: 4 },
    ForkRow { version: 5, height: 5 },
    ForkRow { version: 6, height: 6 },
    ForkRow { version: 7, height: 7 },
    ForkRow { version: 8, height: 8 },
    ForkRow { version: 9, height: 9 },
    ForkRow { version: 10, height: 10 },
    ForkRow { version: 11, height: 11 },
    ForkRow { version: 12, height: 12 },
    ForkRow { version: 13, height: 13 },
    ForkRow { version: 14, height: 14 },
    ForkRow { version: 15, height: 15 },
    ForkRow { version: 16, height: 16 },
    ForkRow { version: 17, height: 17 },
    ForkRow { version: 18, height: 18 },
    ForkRow { version: 19, height: 19 },
    ForkRow { version: 20, height: 20 },
    ForkRow { version: 21, height: 22 },
    ForkRow { version: 22, height: 23 },
    ForkRow { version: 23, height: 24 },
];

/// Stagenet mirrors testnet one block later, so `check_for_conflicts`
/// tests between the two registries exercise genuinely distinct heights.
const STAGENET_SCHEDULE: &[ForkRow] = &[
    ForkRow { version: 1, height: 0 },
    ForkRow { version: 2, height: 3 },
    ForkRow { version: 3, height: 4 },
    ForkRow { version: 4, height: 5 },
    ForkRow { version: 5, height: 6 },
    ForkRow { version: 6, height: 7 },
    ForkRow { version: 7, height: 8 },
    ForkRow { version: 8, height: 9 },
    ForkRow { version: 9, height: 10 },
    ForkRow { version: 10, height: 11 },
    ForkRow { version: 11, height: 12 },
    ForkRow { version: 12, height: 13 },
    ForkRow { version: 13, height: 14 },
    ForkRow { version: 14, height: 15 },
    ForkRow { version: 15, height: 16 },
    ForkRow { version: 16, height: 17 },
    ForkRow { version: 17, height: 18 },
    ForkRow { version: 18, height: 19 },
    ForkRow { version: 19, height: 20 },
    ForkRow { version: 20, height: 21 },
    ForkRow { version: 21, height: 23 },
    ForkRow { version: 22, height: 24 },
    ForkRow { version: 23, height: 25 },
];

/// Every version active from genesis — used by unit tests that want to
/// pin a single protocol version without replaying chain history.
const FAKECHAIN_SCHEDULE: &[ForkRow] = &[ForkRow { version: MAX_VERSION, height: 0 }];

fn schedule_for(net: NetworkType) -> &'static [ForkRow] {
    match net {
        NetworkType::Mainnet => MAINNET_SCHEDULE,
        NetworkType::Testnet => TESTNET_SCHEDULE,
        NetworkType::Stagenet => STAGENET_SCHEDULE,
        NetworkType::Fakechain => FAKECHAIN_SCHEDULE,
    }
}

/// Returns the highest protocol version whose activation height is `<=
/// height`, defaulting to 1.
pub fn version_at(net: NetworkType, height: u64) -> u8 {
    schedule_for(net)
        .iter()
        .rev()
        .find(|row| row.height <= height)
        .map(|row| row.version)
        .unwrap_or(1)
}

/// Named fork-height constants exposed to the difficulty and reward
/// modules without exposing the raw schedule table. `v20_b` / `v23_b` are
/// *not* additional protocol-version integers — they mark named heights
/// inside the v20 / v23 epoch at which the emission curve and coin supply
/// constant switch (one block after v20's activation; 76 blocks after
/// v23's, per the mainnet constitution — not a fixed offset, hence the
/// explicit per-network constants below rather than a derived `+1`).
pub mod heights {
    use super::NetworkType;

    pub fn v(net: NetworkType, version: u8) -> u64 {
        super::schedule_for(net)
            .iter()
            .find(|row| row.version == version)
            .map(|row| row.height)
            .unwrap_or(0)
    }

    /// Height at which the v20 coin-supply/emission switch takes effect.
    pub fn v20_b(net: NetworkType) -> u64 {
        match net {
            NetworkType::Mainnet => 1_132_597,
            NetworkType::Fakechain => 0,
            _ => v(net, 20) + 1,
        }
    }

    /// Height at which the v23 coin-supply/emission switch takes effect.
    pub fn v23_b(net: NetworkType) -> u64 {
        match net {
            NetworkType::Mainnet => 1_183_485,
            NetworkType::Fakechain => 0,
            _ => v(net, 23) + 1,
        }
    }
}
