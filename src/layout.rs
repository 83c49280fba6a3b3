//! Bytecode word layout: opcode, flags and value packed into a `u32`.
//!
//! ```text
//! ┌──────────────────────────┬──────────┬────────────┐
//! │ Value                    │ Flags    │ Opcode     │
//! │ 14 bits                  │ 8 bits   │ 10 bits    │
//! │ [31:18]                  │ [17:10]  │ [9:0]      │
//! └──────────────────────────┴──────────┴────────────┘
//! ```
//!
//! The opcode of a property is its canonical index. The all-ones opcode is
//! reserved as the sentinel meaning "no dispatch entry".

/// Canonical index of a property, used as its runtime dispatch opcode.
pub type Opcode = u16;

/// Bits reserved for the opcode.
pub const OPCODE_BITS: u8 = 10;

/// Bits reserved for the flags.
pub const FLAGS_BITS: u8 = 8;

/// Bit position of the flags field.
pub const FLAGS_SHIFT: u8 = OPCODE_BITS;

/// Bit position of the value field.
pub const VALUE_SHIFT: u8 = FLAGS_SHIFT + FLAGS_BITS;

/// Mask of the opcode field.
pub const OPCODE_MASK: u32 = (1 << OPCODE_BITS) - 1;

/// Mask of the flags field (after shifting down).
pub const FLAGS_MASK: u32 = (1 << FLAGS_BITS) - 1;

/// Reserved opcode for names that never reach the dispatch stage.
pub const SENTINEL_OPCODE: Opcode = OPCODE_MASK as Opcode;

/// Number of opcodes available to real properties.
pub const MAX_OPCODES: usize = SENTINEL_OPCODE as usize;

const _: () = {
    assert!(
        VALUE_SHIFT as u32 + 14 == 32,
        "opcode, flags and value must fill exactly 32 bits"
    );
};

/// Pack an opcode, flags and value into one bytecode word.
///
/// Bits that do not fit a field spill into the next one, exactly like the
/// shift-and-or the build scripts always did; callers that need strict
/// fields should use [`try_encode_opv`].
#[inline]
pub const fn encode_opv(opcode: u32, flags: u32, value: u32) -> u32 {
    opcode | (flags << FLAGS_SHIFT) | (value << VALUE_SHIFT)
}

/// Pack an opcode, flags and value, rejecting out-of-range fields.
pub const fn try_encode_opv(opcode: u32, flags: u32, value: u32) -> Option<u32> {
    if opcode > OPCODE_MASK || flags > FLAGS_MASK || value >= (1 << (32 - VALUE_SHIFT)) {
        return None;
    }
    Some(encode_opv(opcode, flags, value))
}

/// Extract the opcode of a bytecode word.
#[inline]
pub const fn opcode_of(opv: u32) -> Opcode {
    (opv & OPCODE_MASK) as Opcode
}

/// Extract the flags of a bytecode word.
#[inline]
pub const fn flags_of(opv: u32) -> u8 {
    ((opv >> FLAGS_SHIFT) & FLAGS_MASK) as u8
}

/// Extract the value of a bytecode word.
#[inline]
pub const fn value_of(opv: u32) -> u32 {
    opv >> VALUE_SHIFT
}

/// Whether `opcode` is the reserved sentinel.
#[inline]
pub const fn is_sentinel(opcode: Opcode) -> bool {
    opcode == SENTINEL_OPCODE
}
