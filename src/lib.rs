//! Soft-edged Bezier masks for Wavyte video frames.
//!
//! A [`MaskCompositor`] turns the submasks of a keyframe (closed polygons or open paths with cubic
//! Bezier segments) into a grayscale opacity mask and multiplies it into a [`Frame`]:
//!
//! 1. **Rasterize**: tessellate segments, draw them into an 8x oversampled tag buffer, parity-fill
//!    closed shapes and box-filter down to frame resolution.
//! 2. **Feather** (optional): separable recursive Gaussian approximation, columns then rows.
//! 3. **Apply**: multiply the mask into the frame's color or alpha channels.
//!
//! Each phase is a blocking fan-out/fan-in over a dedicated worker pool. Packages cover disjoint
//! row or column ranges, and the mask is bit-identical for any worker count. The mask is cached
//! and only rebuilt when geometry, parameters or the frame format change.
#![forbid(unsafe_code)]

mod foundation;
mod mask;
mod render;

pub use foundation::core::{EQUIV_EPSILON, FrameIndex, approx_eq};
pub use foundation::error::{MaskError, MaskResult};
pub use mask::buffer::{MaskDepth, MaskPlane, MaskSample, Plane};
pub use mask::compositor::{MaskCompositor, MaskCompositorOpts, MaskOutcome, MaskStats};
pub use mask::model::{
    ControlPoint, GeometrySource, MAX_SUBMASKS, MaskKeyframe, MaskMode, MaskParams, Submask,
};
pub use mask::raster::OVERSAMPLE;
pub use render::frame::{ColorModel, Frame, FrameData, PixelLayout, Residency};
pub use render::pool::{WorkerPool, partition};
