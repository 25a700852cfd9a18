//! Floating-point helpers for batch quantities.

/// Tolerance used when comparing quantities and deciding a batch is empty.
pub const EPSILON: f64 = 1e-9;

/// Returns true if `value` is zero within [`EPSILON`].
pub fn is_zero(value: f64) -> bool {
    value.abs() <= EPSILON
}

/// Returns true if `a` is at least `b`, allowing for rounding noise.
pub fn covers(a: f64, b: f64) -> bool {
    a + EPSILON >= b
}

/// Round to a fixed number of decimal places.
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Sum deltas in order. Replaying a batch's events through this reproduces its quantity.
pub fn replay<I>(deltas: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    deltas.into_iter().fold(0.0, |acc, d| acc + d)
}
