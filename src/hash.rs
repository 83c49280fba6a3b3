//! Salted hash functions for the two-level perfect hash.
//!
//! A key is hashed twice, once per salt table. Each byte of the key is
//! weighted by the salt byte at the same position and the products are summed
//! modulo the size of the intermediate table `G`:
//!
//! ```text
//! f(key) = (Σ salt[i] * key[i]) mod |G|      for i < min(len(key), len(salt))
//! slot   = (G[f1(key)] + G[f2(key)]) mod |G|
//! ```
//!
//! The arithmetic is carried out in `u32` with wrapping addition, which is
//! what the generated C function does with `unsigned int`.

/// Lowercase an ASCII byte, leaving every other byte untouched.
#[inline]
pub const fn fold_byte(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

/// Salted weighted-sum hash of `key`, reduced modulo `modulus`.
///
/// Bytes past the end of `salt` do not contribute. `modulus` must be non-zero.
pub const fn salted_sum(key: &[u8], salt: &[u8], modulus: u32) -> u32 {
    debug_assert!(modulus > 0, "modulus must be non-zero");
    let mut acc: u32 = 0;
    let mut i = 0;
    while i < key.len() && i < salt.len() {
        acc = acc.wrapping_add((salt[i] as u32) * (key[i] as u32));
        i += 1;
    }
    acc % modulus
}

/// Compute the slot of an already case-folded key.
///
/// `g.len()` is the working modulus for both salted sums and for the final
/// reduction. Returns `None` when `g` is empty.
pub fn slot_of(key: &[u8], s1: &[u8], s2: &[u8], g: &[u16]) -> Option<usize> {
    let n = u32::try_from(g.len()).ok().filter(|&n| n > 0)?;
    let f1 = salted_sum(key, s1, n) as usize;
    let f2 = salted_sum(key, s2, n) as usize;
    Some(((g[f1] as u32 + g[f2] as u32) % n) as usize)
}
