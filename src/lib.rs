//! # Generated CSS property tables (propmap)
//!
//! Runtime half of the property metadata compiler in `propmap-build`.
//! The compiler emits C fragments; this crate evaluates the very same
//! functions in Rust, which is how the compiler checks its own output and
//! how Rust consumers can use the tables directly.
//!
//! ## Perfect hash
//!
//! ```text
//! f1(key) = Σ S1[i] * key[i]  mod |G|
//! f2(key) = Σ S2[i] * key[i]  mod |G|
//! slot    = (G[f1] + G[f2])   mod |G|
//! ```
//!
//! Keys are ASCII case-folded before hashing. A lookup is accepted only if
//! the slot is occupied and its stored key equals the folded query byte for
//! byte, so out-of-set queries never produce false positives.
//!
//! ```
//! use propmap::{PropertyLookup, SlotEntry};
//!
//! static G: [u16; 5] = [0, 0, 0, 1, 0];
//! static SLOTS: [Option<SlotEntry<'static, u8>>; 5] = [
//!     Some(SlotEntry::new("a", 1)),
//!     Some(SlotEntry::new("b", 2)),
//!     None,
//!     None,
//!     None,
//! ];
//!
//! let table = PropertyLookup::new(&G, &[1], &[2], &SLOTS, 63).unwrap();
//! assert_eq!(table.lookup_str("B").map(|e| e.handler), Some(2));
//! assert!(table.lookup_str("c").is_none());
//! ```

pub mod fixed;
pub mod hash;
pub mod layout;
pub mod lookup;

pub use fixed::{FIXED_FRAC_BITS, FIXED_ONE, fixed_bits, from_fixed, to_fixed};
pub use hash::{fold_byte, salted_sum, slot_of};
pub use layout::{
    FLAGS_BITS, FLAGS_MASK, FLAGS_SHIFT, MAX_OPCODES, OPCODE_BITS, OPCODE_MASK, Opcode,
    SENTINEL_OPCODE, VALUE_SHIFT, encode_opv, flags_of, is_sentinel, opcode_of, try_encode_opv,
    value_of,
};
pub use lookup::{MAX_KEY_LIMIT, PropertyLookup, SlotEntry, SlotKey};
