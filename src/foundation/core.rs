/// Tolerance used when deciding whether two cached floating values are the same.
pub const EQUIV_EPSILON: f64 = 0.001;

/// Absolute 0-based project position the mask geometry is resolved at.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Return `true` when `a` and `b` differ by less than [`EQUIV_EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EQUIV_EPSILON
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
