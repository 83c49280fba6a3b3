//! 22.10 fixed-point values as stored in property bytecode.

/// Fractional bits of a fixed-point value.
pub const FIXED_FRAC_BITS: u32 = 10;

/// `1.0` in fixed-point.
pub const FIXED_ONE: i32 = 1 << FIXED_FRAC_BITS;

/// Convert a float to fixed-point, rounding half away from zero.
///
/// Values outside the representable range wrap to their low 32 bits, the
/// same bit pattern a 32-bit store would produce.
pub fn to_fixed(value: f64) -> i32 {
    let scaled = value * f64::from(FIXED_ONE);
    let rounded = if scaled < 0.0 { scaled - 0.5 } else { scaled + 0.5 };
    // Truncation toward zero completes the rounding.
    rounded.trunc() as i64 as i32
}

/// Raw bit pattern of [`to_fixed`], as printed in generated sources.
pub fn fixed_bits(value: f64) -> u32 {
    to_fixed(value) as u32
}

/// Convert a fixed-point value back to a float.
pub fn from_fixed(fixed: i32) -> f64 {
    f64::from(fixed) / f64::from(FIXED_ONE)
}
