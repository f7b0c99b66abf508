use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only at the boundary, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/rendering.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `numerator / denominator` as a fraction, or zero for a zero denominator.
#[inline]
pub fn ratio(numerator: u32, denominator: u32) -> Fixed64 {
    if denominator == 0 {
        return Fixed64::ZERO;
    }
    Fixed64::from_num(numerator) / Fixed64::from_num(denominator)
}
