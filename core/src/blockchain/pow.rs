/// Proof-of-work hash validation.
///
/// A candidate hash is valid at difficulty `D` iff `hash · D` fits in 256
/// bits — equivalently `hash <= 2^256 / D`. Rather than materialise a
/// 2^256/D target and compare, we compute the 320-bit product directly and
/// check the top 64 bits are zero, the way the reference implementation
/// does it: the highest limb is multiplied first so a typical random hash
/// (which almost always overflows there) short-circuits without touching
/// the lower three limbs.
use crate::Hash256;

/// `a * b` split into 64-bit (low, high) halves of the 128-bit product.
#[inline]
fn mul64(a: u64, b: u64) -> (u64, u64) {
    let product = a as u128 * b as u128;
    (product as u64, (product >> 64) as u64)
}

/// `a + b + carry_in`, returning `(sum, carry_out)`.
#[inline]
fn adc(a: u64, b: u64, carry_in: bool) -> (u64, bool) {
    let (s1, c1) = a.overflowing_add(b);
    let (s2, c2) = s1.overflowing_add(carry_in as u64);
    (s2, c1 || c2)
}

/// Returns true iff `hash` meets `difficulty`.
///
/// `hash` is interpreted as four little-endian 64-bit limbs, least
/// significant first. `difficulty == 0` is the reserved error sentinel
/// (§3 data model) and never validates.
pub fn check_hash(hash: &Hash256, difficulty: u64) -> bool {
    if difficulty == 0 {
        return false;
    }

    let h = hash.limbs_le();

    // Highest limb first: early-out for the overwhelming majority of
    // candidate hashes, which overflow here.
    let (top, high3) = mul64(h[3], difficulty);
    if high3 != 0 {
        return false;
    }

    let (_low0, cur) = mul64(h[0], difficulty);

    let (low1, high1) = mul64(h[1], difficulty);
    let (_sum1, carry) = adc(cur, low1, false);
    let cur = high1;

    let (low2, high2) = mul64(h[2], difficulty);
    let (_sum2, carry) = adc(cur, low2, carry);
    let (_sum3, carry) = adc(high2, top, carry);

    !carry
}
