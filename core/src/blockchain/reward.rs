/// Block reward / coinbase emission schedule.
///
/// Emission has moved through several hard-fork eras, each changing the
/// active coin-supply ceiling and the right-shift applied to the
/// remaining, not-yet-generated supply. A handful of heights additionally
/// carry a hardcoded one-off reward (genesis premine, community airdrops)
/// that bypasses the formula entirely.
///
/// All monetary quantities are atomic units of the smallest denomination;
/// `already_generated`/`COIN_SUPPLY` are carried as `u128` since later
/// eras raise the ceiling close to `u64::MAX`.
use crate::error::ConsensusError;
use crate::fork::heights;
use crate::network::NetworkType;

// ---------------------------------------------------------------------------
// Coin supply ceilings by era
// ---------------------------------------------------------------------------

/// Canonical CryptoNote money supply ceiling (`u64::MAX`), used by the
/// `MONEY_SUPPLY`-named eras below.
const MONEY_SUPPLY: u128 = u64::MAX as u128;
/// Electroneum's published total supply (21,000,000,000 ETN at 2 decimal
/// places of atomic precision).
const MONEY_SUPPLY_ETN: u128 = 21_000_000_000 * 100;
const TOKENS: u128 = u64::MAX as u128;
const ELECTRONERO_TOKENS: u128 = u64::MAX as u128;
/// Equal to the hardcoded injection at height 1_132_597 (the v20_b
/// activation height) — the airdrop at that height appears, in the
/// source this was distilled from, to re-issue exactly the new supply
/// ceiling it introduces.
const ELECTRONERO_PULSE: u128 = 3_333_333_333_310_301_990;
/// Final redenominated ceiling, same order of magnitude as
/// `ELECTRONERO_PULSE`; not independently confirmed (see DESIGN.md).
const ELECTRONERO_COINS: u128 = 3_333_333_333_333_333_333;

/// Tail emission subsidy, substituted once `base_reward` would otherwise
/// fall below 666 atomic units after the supply ceiling is exhausted.
const FINAL_SUBSIDY_PER_MINUTE: u64 = 100_000_000;

/// Start of the window in which the post-v7 polynomial supply-fraction
/// override applies, combined with `COIN_EMISSION_HEIGHT_INTERVAL` below.
/// Chosen to bracket the early post-v7 (height 307_003) chain history;
/// not an externally confirmed historical constant (see DESIGN.md).
const PEAK_COIN_EMISSION_HEIGHT: u64 = 307_000;
const COIN_EMISSION_HEIGHT_INTERVAL: u64 = 500_000;

/// Heights carrying a hardcoded reward, checked before the continuous
/// formula and never folded into it.
fn hardcoded_injection(height: u64) -> Option<u64> {
    match height {
        1 => Some(1_260_000_000_000),
        307_003 => Some(1_260_000_000_000),
        310_790 => Some(1_260_000_000_000),
        500_060 => Some(613_090_000_000_000),
        1_183_410..=1_183_413 => Some(613_090_000_000_000),
        1_132_597 => Some(3_333_333_333_310_301_990),
        _ => None,
    }
}

/// Selects the coin-supply ceiling active at `height`/`version`.
fn coin_supply(net: NetworkType, version: u8, height: u64) -> u128 {
    let v20_height = heights::v(net, 20);
    let v23_b_height = heights::v23_b(net);

    if height < v20_height {
        legacy_supply_by_version(version)
    } else if height < v23_b_height {
        ELECTRONERO_PULSE
    } else {
        ELECTRONERO_COINS
    }
}

/// Pre-v20 eras each used a differently-named supply constant. The exact
/// version boundaries are not spelled out beyond "by version"; this
/// mirrors the boundaries the emission-speed-factor table already uses
/// (7, 16, 18) so the two tables stay consistent with each other.
fn legacy_supply_by_version(version: u8) -> u128 {
    if version < 7 {
        MONEY_SUPPLY_ETN
    } else if version < 16 {
        MONEY_SUPPLY
    } else if version < 18 {
        TOKENS
    } else {
        ELECTRONERO_TOKENS
    }
}

/// `T_min = DIFFICULTY_TARGET / 60`, then the emission-speed-factor table.
fn emission_speed_factor(net: NetworkType, version: u8, height: u64) -> u32 {
    let target = crate::blockchain::difficulty::target_seconds_for_version(version);
    let t_min = (target / 60) as i64;

    let factor = if version < 7 {
        20 - (t_min - 1)
    } else if version < 10 {
        20 + (t_min - 1)
    } else if version < 16 {
        20 + (t_min - 2)
    } else if version < 17 {
        20 - (t_min - 1)
    } else if version < 18 {
        20 + (t_min + 1)
    } else if version < 19 {
        20 + (t_min + 9)
    } else if version < 20 {
        20 + (t_min + 6)
    } else if version < 21 {
        20 + (t_min + 9)
    } else if version < 22 {
        20 + (t_min + 7)
    } else if version < 23 {
        20 + (t_min + 9)
    } else if height < heights::v23_b(net) {
        20 + (t_min + 8)
    } else {
        20 - (t_min - 3)
    };

    factor.max(0) as u32
}

/// Full-reward-zone size (bytes) by epoch — blocks under this size pay
/// the unpenalised `base_reward`.
fn full_reward_zone(version: u8) -> u64 {
    if version < 7 {
        20_000
    } else if version < 16 {
        60_000
    } else {
        300_000
    }
}

fn supply_pct(k: f64) -> f64 {
    0.1888 + k * (0.023 + k * 0.0032)
}

/// Arguments to [`reward`] describing the block whose coinbase is being
/// computed.
#[derive(Debug, Clone, Copy)]
pub struct RewardInputs {
    pub median_size: u64,
    pub current_size: u64,
    pub already_generated: u128,
    pub version: u8,
    pub height: u64,
}

/// Computes the coinbase reward for a block, or `BlockTooLarge` if
/// `current_size` exceeds twice the effective median.
pub fn reward(net: NetworkType, inputs: &RewardInputs) -> Result<u64, ConsensusError> {
    if let Some(injected) = hardcoded_injection(inputs.height) {
        return Ok(injected);
    }

    let supply = coin_supply(net, inputs.version, inputs.height);
    let factor = emission_speed_factor(net, inputs.version, inputs.height);

    let window_end = PEAK_COIN_EMISSION_HEIGHT + COIN_EMISSION_HEIGHT_INTERVAL;
    let mut base_reward: u128 = if inputs.version > 7 && inputs.height < window_end {
        let k = inputs.height as f64 / COIN_EMISSION_HEIGHT_INTERVAL as f64;
        let pct = supply_pct(k);
        (supply as f64 * pct) as u128
    } else {
        supply.saturating_sub(inputs.already_generated) >> factor
    };

    if inputs.version > 7 {
        base_reward = (base_reward / 10) * 10;
    }

    if base_reward < 666 && inputs.already_generated >= supply {
        base_reward = FINAL_SUBSIDY_PER_MINUTE as u128;
    }

    apply_full_reward_zone_penalty(inputs, base_reward)
}

fn apply_full_reward_zone_penalty(
    inputs: &RewardInputs,
    base_reward: u128,
) -> Result<u64, ConsensusError> {
    let zone = full_reward_zone(inputs.version);
    let median = inputs.median_size.max(zone) as u128;
    let current = inputs.current_size as u128;

    if current <= median {
        return Ok(base_reward.min(u64::MAX as u128) as u64);
    }
    if current > 2 * median {
        return Err(ConsensusError::BlockTooLarge {
            current: inputs.current_size,
            median: median as u64,
        });
    }

    let numerator = base_reward
        .saturating_mul(2 * median - current)
        .saturating_mul(current);
    let denominator = median * median;
    let penalised = numerator / denominator;
    Ok(penalised.min(u64::MAX as u128) as u64)
}
