//! Minimal perfect hash construction.
//!
//! Keys are placed at slot == their position in the input (the string
//! table order), so the slot of a key doubles as its string index.
//!
//! Construction follows the classic two-function graph scheme:
//!
//! 1. pick random salts `S1`, `S2` and a table size `|G| > n`
//! 2. every key `i` becomes an edge `f1(key) -- f2(key)` labelled `i`
//! 3. walk each connected component, assigning `G` so that
//!    `(G[u] + G[v]) mod |G| == i` holds on every edge
//!
//! A self-loop or an inconsistent cycle fails the attempt; the salts are
//! re-drawn and every tenth failure grows `|G|` by 5%. The result is
//! verified with the runtime slot function before it is returned.

use std::collections::HashSet;

use tracing::debug;

use propmap::{PropertyLookup, SlotKey, salted_sum, slot_of};

use crate::config::HashConfig;

/// `G` holds `u16` values, so it can have at most this many entries.
const MAX_TABLE_SIZE: usize = u16::MAX as usize + 1;

const FALLBACK_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Perfect hash construction errors.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("hash key '{key}' is {len} bytes long; at most {max} are supported")]
    KeyTooLong { key: String, len: usize, max: usize },

    #[error("hash key '{0}' appears twice")]
    DuplicateKey(String),

    #[error(
        "failed to construct a perfect hash for {keys} keys after {attempts} attempts (table size {table_size})"
    )]
    ConstructionFailed {
        keys: usize,
        attempts: usize,
        table_size: usize,
    },
}

/// One occupied slot: the lowercase key and the handler it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub key: String,
    pub handler: String,
}

impl Slot {
    pub fn new(key: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            handler: handler.into(),
        }
    }
}

impl SlotKey for Slot {
    fn key(&self) -> &str {
        &self.key
    }
}

/// A constructed perfect hash over a fixed key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfectHash {
    pub g: Vec<u16>,
    pub s1: Vec<u8>,
    pub s2: Vec<u8>,
    /// `|G|` entries; slot `i` holds key `i`.
    pub slots: Vec<Option<Slot>>,
    pub max_key_len: usize,
}

impl PerfectHash {
    pub fn table_size(&self) -> usize {
        self.g.len()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runtime lookup view over these tables.
    pub fn as_lookup(&self) -> Result<PropertyLookup<'_, Slot>, String> {
        PropertyLookup::new(&self.g, &self.s1, &self.s2, &self.slots, self.max_key_len)
    }
}

/// Deterministic xorshift PRNG for salt selection.
#[derive(Debug, Clone)]
struct Xorshift64(u64);

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self(if seed == 0 { FALLBACK_SEED } else { seed })
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Salt byte in `1..=255`.
    fn next_salt(&mut self) -> u8 {
        (self.next() % 255) as u8 + 1
    }
}

/// Builds [`PerfectHash`]es with a fixed configuration.
#[derive(Debug, Clone, Copy)]
pub struct PerfectHashBuilder {
    config: HashConfig,
}

impl PerfectHashBuilder {
    pub fn new(config: HashConfig) -> Self {
        Self { config }
    }

    /// Build a hash placing `entries[i]` at slot `i`.
    ///
    /// Keys are folded to lowercase before hashing.
    pub fn build(&self, entries: Vec<Slot>) -> Result<PerfectHash, HashError> {
        let entries: Vec<Slot> = entries
            .into_iter()
            .map(|s| Slot {
                key: s.key.to_ascii_lowercase(),
                handler: s.handler,
            })
            .collect();

        let mut seen = HashSet::with_capacity(entries.len());
        for slot in &entries {
            if slot.key.len() > self.config.max_key_len {
                return Err(HashError::KeyTooLong {
                    key: slot.key.clone(),
                    len: slot.key.len(),
                    max: self.config.max_key_len,
                });
            }
            if !seen.insert(slot.key.as_str()) {
                return Err(HashError::DuplicateKey(slot.key.clone()));
            }
        }

        let n = entries.len();
        let keys: Vec<&[u8]> = entries.iter().map(|s| s.key.as_bytes()).collect();
        let salt_len = keys.iter().map(|k| k.len()).max().unwrap_or(0).max(1);

        let mut rng = Xorshift64::new(self.config.seed);
        let mut table_size = (n * 21).div_ceil(10) + 1;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 && attempt % 10 == 0 {
                table_size = (table_size + 1).max(table_size * 105 / 100);
            }
            if table_size > MAX_TABLE_SIZE {
                return Err(HashError::ConstructionFailed {
                    keys: n,
                    attempts: attempt,
                    table_size,
                });
            }

            let s1: Vec<u8> = (0..salt_len).map(|_| rng.next_salt()).collect();
            let s2: Vec<u8> = (0..salt_len).map(|_| rng.next_salt()).collect();

            let Some(g) = assign(&keys, &s1, &s2, table_size) else {
                debug!(attempt, table_size, "perfect hash attempt failed");
                continue;
            };
            if !verify(&keys, &s1, &s2, &g) {
                debug!(attempt, table_size, "perfect hash failed verification");
                continue;
            }

            debug!(attempt, table_size, keys = n, "perfect hash constructed");
            let mut slots = vec![None; table_size];
            for (slot, entry) in slots.iter_mut().zip(entries) {
                *slot = Some(entry);
            }
            return Ok(PerfectHash {
                g,
                s1,
                s2,
                slots,
                max_key_len: self.config.max_key_len,
            });
        }

        Err(HashError::ConstructionFailed {
            keys: n,
            attempts: self.config.max_attempts,
            table_size,
        })
    }
}

/// Solve `G` over the key graph, or `None` if the salts do not work out.
fn assign(keys: &[&[u8]], s1: &[u8], s2: &[u8], table_size: usize) -> Option<Vec<u16>> {
    let modulus = table_size as u32;
    let mut adjacency: Vec<Vec<(usize, u32)>> = vec![Vec::new(); table_size];
    for (i, key) in keys.iter().enumerate() {
        let u = salted_sum(key, s1, modulus) as usize;
        let v = salted_sum(key, s2, modulus) as usize;
        if u == v {
            return None;
        }
        adjacency[u].push((v, i as u32));
        adjacency[v].push((u, i as u32));
    }

    let mut g: Vec<Option<u32>> = vec![None; table_size];
    let mut stack = Vec::new();
    for root in 0..table_size {
        if g[root].is_some() {
            continue;
        }
        g[root] = Some(0);
        stack.push(root);
        while let Some(u) = stack.pop() {
            let gu = g[u]?;
            for &(v, label) in &adjacency[u] {
                let want = (label + modulus - gu) % modulus;
                match g[v] {
                    None => {
                        g[v] = Some(want);
                        stack.push(v);
                    }
                    Some(gv) if gv == want => {}
                    Some(_) => return None,
                }
            }
        }
    }

    g.into_iter().map(|v| v.map(|v| v as u16)).collect()
}

/// Every key lands on its own index under the runtime slot function.
fn verify(keys: &[&[u8]], s1: &[u8], s2: &[u8], g: &[u16]) -> bool {
    keys.iter()
        .enumerate()
        .all(|(i, key)| slot_of(key, s1, s2, g) == Some(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slots(keys: &[&str]) -> Vec<Slot> {
        keys.iter()
            .map(|k| Slot::new(*k, format!("css__parse_{}", k.replace('-', "_"))))
            .collect()
    }

    fn builder() -> PerfectHashBuilder {
        PerfectHashBuilder::new(HashConfig::default())
    }

    const KEYS: &[&str] = &[
        "azimuth",
        "background",
        "background-color",
        "border",
        "border-top",
        "color",
        "inline-size",
        "margin",
        "width",
        "z-index",
    ];

    #[test]
    fn keys_land_on_their_index() {
        let hash = builder().build(slots(KEYS)).unwrap();
        assert!(hash.table_size() > KEYS.len());
        assert_eq!(hash.len(), KEYS.len());
        assert_eq!(hash.s1.len(), "background-color".len());
        assert_eq!(hash.s1.len(), hash.s2.len());
        assert!(hash.s1.iter().chain(&hash.s2).all(|&b| b != 0));

        let lookup = hash.as_lookup().unwrap();
        for (i, key) in KEYS.iter().enumerate() {
            assert_eq!(lookup.slot(key.as_bytes()), Some(i));
            let entry = lookup.lookup_str(key).unwrap();
            assert_eq!(entry.key, *key);
        }
    }

    #[test]
    fn lookup_folds_case_and_rejects_outsiders() {
        let hash = builder().build(slots(KEYS)).unwrap();
        let lookup = hash.as_lookup().unwrap();
        assert_eq!(
            lookup.lookup_str("Z-Index").map(|s| s.handler.as_str()),
            Some("css__parse_z_index")
        );
        for outsider in ["z_index", "colour", "border-to", "widths", "", "-"] {
            assert!(lookup.lookup_str(outsider).is_none(), "{}", outsider);
        }
    }

    #[test]
    fn same_seed_same_tables() {
        let a = builder().build(slots(KEYS)).unwrap();
        let b = builder().build(slots(KEYS)).unwrap();
        assert_eq!(a, b);

        let other = PerfectHashBuilder::new(HashConfig {
            seed: 7,
            ..HashConfig::default()
        })
        .build(slots(KEYS))
        .unwrap();
        assert_ne!(a.s1, other.s1);
    }

    #[test]
    fn zero_seed_still_works() {
        let hash = PerfectHashBuilder::new(HashConfig {
            seed: 0,
            ..HashConfig::default()
        })
        .build(slots(KEYS))
        .unwrap();
        assert_eq!(
            hash.as_lookup().unwrap().lookup_str("color").unwrap().key,
            "color"
        );
    }

    #[test]
    fn empty_key_set() {
        let hash = builder().build(Vec::new()).unwrap();
        assert!(hash.is_empty());
        assert_eq!(hash.table_size(), 1);
        assert!(hash.as_lookup().unwrap().lookup_str("color").is_none());
    }

    #[test]
    fn rejects_long_keys() {
        let long = "x".repeat(64);
        let err = builder().build(slots(&["color", &long])).unwrap_err();
        assert!(matches!(err, HashError::KeyTooLong { len: 64, max: 63, .. }));
    }

    #[test]
    fn rejects_keys_equal_after_folding() {
        let err = builder().build(slots(&["color", "COLOR"])).unwrap_err();
        assert!(matches!(err, HashError::DuplicateKey(ref k) if k == "color"));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let never = PerfectHashBuilder::new(HashConfig {
            max_attempts: 0,
            ..HashConfig::default()
        });
        let err = never.build(slots(KEYS)).unwrap_err();
        assert!(matches!(
            err,
            HashError::ConstructionFailed { keys: 10, attempts: 0, .. }
        ));
    }

    #[test]
    fn too_many_keys_for_u16_table() {
        let keys: Vec<Slot> = (0..32_000).map(|i| Slot::new(format!("k{}", i), "h")).collect();
        let err = builder().build(keys).unwrap_err();
        match err {
            HashError::ConstructionFailed {
                keys, table_size, ..
            } => {
                assert_eq!(keys, 32_000);
                assert!(table_size > MAX_TABLE_SIZE);
            }
            other => panic!("Expected ConstructionFailed, got: {:?}", other),
        }
    }

    fn key_set() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z][a-z-]{0,20}", 1..120)
            .prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn constructed_hash_is_injective(keys in key_set()) {
            let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let hash = builder().build(slots(&refs)).unwrap();
            let lookup = hash.as_lookup().unwrap();

            let mut used = HashSet::new();
            for (i, key) in keys.iter().enumerate() {
                let slot = lookup.slot(key.as_bytes()).unwrap();
                prop_assert_eq!(slot, i);
                prop_assert!(used.insert(slot));
                prop_assert_eq!(&lookup.lookup_str(key).unwrap().key, key);
                prop_assert_eq!(
                    lookup.lookup_str(&key.to_ascii_uppercase()).map(|s| s.key.as_str()),
                    Some(key.as_str())
                );
            }
        }
    }
}
