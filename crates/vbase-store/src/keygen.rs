//! Key derivation for generated keys.

use rand::rngs::OsRng;
use rand::RngCore;

/// 16 lower-case hex characters of a random 64-bit integer.
pub fn random_key() -> Vec<u8> {
    hex::encode(OsRng.next_u64().to_be_bytes()).into_bytes()
}

/// Decimal digits of `n` in reverse order.
///
/// Consecutive counter values differ in their first byte, which spreads
/// sequential inserts across the key space.
pub fn sequential_key(n: i64) -> Vec<u8> {
    let mut digits = n.to_string().into_bytes();
    digits.reverse();
    digits
}
