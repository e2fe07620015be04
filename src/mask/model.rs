//! Geometry model: control points, submasks, mask parameters and the keyframe source interface.

use crate::foundation::core::{FrameIndex, approx_eq};
use crate::foundation::error::{MaskError, MaskResult};
use kurbo::Point;

/// Submask tags are 8-bit values in the oversampled buffer (`0` means empty), so at most 255
/// submasks can be told apart.
pub const MAX_SUBMASKS: usize = 255;

/// One vertex of a mask outline with its incoming and outgoing Bezier handles.
///
/// Handles are offsets relative to `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
    pub control_in_x: f64,
    pub control_in_y: f64,
    pub control_out_x: f64,
    pub control_out_y: f64,
}

impl ControlPoint {
    /// A corner point with zero-length handles.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_handles(mut self, control_in: (f64, f64), control_out: (f64, f64)) -> Self {
        (self.control_in_x, self.control_in_y) = control_in;
        (self.control_out_x, self.control_out_y) = control_out;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Absolute position of the outgoing handle.
    pub fn out_handle(&self) -> Point {
        Point::new(self.x + self.control_out_x, self.y + self.control_out_y)
    }

    /// Absolute position of the incoming handle.
    pub fn in_handle(&self) -> Point {
        Point::new(self.x + self.control_in_x, self.y + self.control_in_y)
    }

    /// Whether the position and both handles are finite.
    pub fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.control_in_x,
            self.control_in_y,
            self.control_out_x,
            self.control_out_y,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Field-wise equality within the cache epsilon.
    pub fn equivalent(&self, other: &Self) -> bool {
        approx_eq(self.x, other.x)
            && approx_eq(self.y, other.y)
            && approx_eq(self.control_in_x, other.control_in_x)
            && approx_eq(self.control_in_y, other.control_in_y)
            && approx_eq(self.control_out_x, other.control_out_x)
            && approx_eq(self.control_out_y, other.control_out_y)
    }
}

/// Ordered point sequence; order defines segment order and winding.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Submask {
    pub points: Vec<ControlPoint>,
}

impl Submask {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }

    /// Same point count and every point [`ControlPoint::equivalent`].
    pub fn equivalent(&self, other: &Self) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.equivalent(b))
    }
}

/// How the rasterized geometry turns into opacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Open path stroked with `path_radius`; keep what the stroke covers.
    FillPathMultiply,
    /// Open path stroked with `path_radius`; remove what the stroke covers.
    FillPathSubtract,
    /// Closed polygon, parity-filled; keep the inside.
    FillAlphaMultiply,
    /// Closed polygon, parity-filled; remove the inside.
    #[default]
    FillAlphaSubtract,
    /// Guides only, the frame is not masked.
    None,
}

impl MaskMode {
    pub fn is_path(self) -> bool {
        matches!(self, Self::FillPathMultiply | Self::FillPathSubtract)
    }

    pub fn is_alpha(self) -> bool {
        matches!(self, Self::FillAlphaMultiply | Self::FillAlphaSubtract)
    }

    pub fn is_subtract(self) -> bool {
        matches!(self, Self::FillPathSubtract | Self::FillAlphaSubtract)
    }
}

/// Concrete parameters for one `apply` invocation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaskParams {
    pub mode: MaskMode,
    /// Percent, `0..=100`.
    pub opacity: f64,
    /// Blur radius in pixels; `0` disables feathering.
    pub feather: f64,
    /// Half-width of stroked paths in pixels.
    pub path_radius: f64,
}

impl MaskParams {
    /// Clamp opacity into range and reject unusable feather/radius values.
    pub fn validate(mut self) -> MaskResult<Self> {
        if !self.opacity.is_finite() {
            return Err(MaskError::validation("mask opacity must be finite"));
        }
        self.opacity = self.opacity.clamp(0.0, 100.0);
        if !self.feather.is_finite() || self.feather < 0.0 {
            return Err(MaskError::validation("mask feather must be finite and >= 0"));
        }
        if !self.path_radius.is_finite() || self.path_radius < 0.0 {
            return Err(MaskError::validation(
                "mask path radius must be finite and >= 0",
            ));
        }
        Ok(self)
    }

    /// Same mode and every numeric parameter within the cache epsilon.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.mode == other.mode
            && approx_eq(self.opacity, other.opacity)
            && approx_eq(self.feather, other.feather)
            && approx_eq(self.path_radius, other.path_radius)
    }
}

/// Keyframed mask geometry as seen by the compositor.
///
/// Implementations resolve interpolation themselves; the compositor calls each method once per
/// `apply` and never mutates what it gets back.
pub trait GeometrySource {
    fn submask_count(&self, at: FrameIndex) -> usize;
    fn points(&self, submask: usize, at: FrameIndex) -> Vec<ControlPoint>;
    fn opacity(&self, at: FrameIndex) -> f64;
    fn feather(&self, at: FrameIndex) -> f64;
    fn path_radius(&self, at: FrameIndex) -> f64;
}

/// A single resolved keyframe, identical at every project position.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaskKeyframe {
    pub submasks: Vec<Submask>,
    pub opacity: f64,
    pub feather: f64,
    pub path_radius: f64,
}

impl Default for MaskKeyframe {
    fn default() -> Self {
        Self {
            submasks: Vec::new(),
            opacity: 100.0,
            feather: 0.0,
            path_radius: 1.0,
        }
    }
}

impl MaskKeyframe {
    pub fn new(submasks: Vec<Submask>) -> Self {
        Self {
            submasks,
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_feather(mut self, feather: f64) -> Self {
        self.feather = feather;
        self
    }

    pub fn with_path_radius(mut self, path_radius: f64) -> Self {
        self.path_radius = path_radius;
        self
    }
}

impl GeometrySource for MaskKeyframe {
    fn submask_count(&self, _at: FrameIndex) -> usize {
        self.submasks.len()
    }

    fn points(&self, submask: usize, _at: FrameIndex) -> Vec<ControlPoint> {
        self.submasks
            .get(submask)
            .map(|s| s.points.clone())
            .unwrap_or_default()
    }

    fn opacity(&self, _at: FrameIndex) -> f64 {
        self.opacity
    }

    fn feather(&self, _at: FrameIndex) -> f64 {
        self.feather
    }

    fn path_radius(&self, _at: FrameIndex) -> f64 {
        self.path_radius
    }
}

/// Resolve parameters and submasks for `at`, enforcing [`MAX_SUBMASKS`].
pub(crate) fn resolve(
    source: &dyn GeometrySource,
    at: FrameIndex,
    mode: MaskMode,
) -> MaskResult<(MaskParams, Vec<Submask>)> {
    let count = source.submask_count(at);
    if count > MAX_SUBMASKS {
        return Err(MaskError::validation(format!(
            "{count} submasks exceed the limit of {MAX_SUBMASKS}"
        )));
    }
    let params = MaskParams {
        mode,
        opacity: source.opacity(at),
        feather: source.feather(at),
        path_radius: source.path_radius(at),
    }
    .validate()?;
    let submasks = (0..count)
        .map(|i| Submask::new(source.points(i, at)))
        .collect();
    Ok((params, submasks))
}

#[cfg(test)]
#[path = "../../tests/unit/mask/model.rs"]
mod tests;
