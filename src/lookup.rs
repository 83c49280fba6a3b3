//! Case-insensitive property lookup over a generated perfect-hash table.

use crate::hash::{fold_byte, slot_of};

/// Longest key any table can hold; the stored length is a single byte.
pub const MAX_KEY_LIMIT: usize = u8::MAX as usize;

/// Anything that can sit in a slot of the table.
pub trait SlotKey {
    /// The lowercase key stored in the slot.
    fn key(&self) -> &str;
}

/// Borrowed slot entry, the shape of a statically generated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotEntry<'a, H> {
    pub name: &'a str,
    pub handler: H,
}

impl<'a, H> SlotEntry<'a, H> {
    pub const fn new(name: &'a str, handler: H) -> Self {
        Self { name, handler }
    }
}

impl<H> SlotKey for SlotEntry<'_, H> {
    fn key(&self) -> &str {
        self.name
    }
}

/// Read-only view over `(G, S1, S2, slots)`.
///
/// In-set keys never collide. Out-of-set keys may land on an occupied slot;
/// the exact byte comparison against the stored key rejects them.
#[derive(Clone, Copy, Debug)]
pub struct PropertyLookup<'a, E> {
    g: &'a [u16],
    s1: &'a [u8],
    s2: &'a [u8],
    slots: &'a [Option<E>],
    max_key_len: usize,
}

impl<'a, E: SlotKey> PropertyLookup<'a, E> {
    /// Wrap generated tables.
    ///
    /// `slots` must have one entry per element of `g`, and both salt tables
    /// must have the same length.
    pub fn new(
        g: &'a [u16],
        s1: &'a [u8],
        s2: &'a [u8],
        slots: &'a [Option<E>],
        max_key_len: usize,
    ) -> Result<Self, String> {
        if g.is_empty() {
            return Err("intermediate table G is empty".into());
        }
        if slots.len() != g.len() {
            return Err(format!(
                "slot table has {} entries but G has {}",
                slots.len(),
                g.len()
            ));
        }
        if s1.len() != s2.len() {
            return Err(format!(
                "salt tables differ in length ({} vs {})",
                s1.len(),
                s2.len()
            ));
        }
        if max_key_len == 0 || max_key_len > MAX_KEY_LIMIT {
            return Err(format!(
                "max key length {} outside 1..={}",
                max_key_len, MAX_KEY_LIMIT
            ));
        }
        Ok(Self {
            g,
            s1,
            s2,
            slots,
            max_key_len,
        })
    }

    /// Resolve `name` (any ASCII case) to its slot entry.
    pub fn lookup(&self, name: &[u8]) -> Option<&'a E> {
        let len = name.len();
        if len > self.max_key_len {
            return None;
        }

        let mut lower = [0u8; MAX_KEY_LIMIT];
        for (dst, &src) in lower.iter_mut().zip(name) {
            *dst = fold_byte(src);
        }
        let lower = &lower[..len];

        let slot = self.slot(lower)?;
        let entry = self.slots.get(slot)?.as_ref()?;
        let key = entry.key().as_bytes();
        if key.len() != len || key != lower {
            return None;
        }
        Some(entry)
    }

    /// [`lookup`](Self::lookup) for string input.
    #[inline]
    pub fn lookup_str(&self, name: &str) -> Option<&'a E> {
        self.lookup(name.as_bytes())
    }

    /// Slot of an already case-folded key. Does not verify membership.
    #[inline]
    pub fn slot(&self, folded: &[u8]) -> Option<usize> {
        slot_of(folded, self.s1, self.s2, self.g)
    }

    /// Size of the slot table (`|G|`).
    pub fn table_size(&self) -> usize {
        self.g.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Occupied slots in slot order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &'a E)> + 'a {
        let slots = self.slots;
        slots
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.as_ref().map(|e| (slot, e)))
    }
}
