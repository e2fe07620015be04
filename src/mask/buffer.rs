//! Single- and multi-channel sample planes shared by the mask phases.

use crate::foundation::error::{MaskError, MaskResult};

/// Row-major 2-D sample buffer.
///
/// `stride` is the number of samples per row (`width * channels`). Row accessors slice into the
/// flat storage, so an out-of-range row index panics instead of reading a neighbour's memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Plane<T> {
    /// Allocate a zeroed plane, reporting allocation failure instead of aborting.
    pub fn try_new(width: usize, height: usize, channels: usize) -> MaskResult<Self> {
        let len = plane_len(width, height, channels)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            MaskError::allocation(format!(
                "failed to allocate {width}x{height}x{channels} plane: {e}"
            ))
        })?;
        data.resize(len, T::default());
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Wrap existing samples; `data.len()` must equal `width * height * channels`.
    pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<T>) -> MaskResult<Self> {
        let len = plane_len(width, height, channels)?;
        if data.len() != len {
            return Err(MaskError::validation(format!(
                "plane expects {len} samples for {width}x{height}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per row.
    pub fn stride(&self) -> usize {
        self.width * self.channels
    }

    pub fn row(&self, y: usize) -> &[T] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let stride = self.stride();
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// Sample at column `x`, row `y`, first channel.
    pub fn get(&self, x: usize, y: usize) -> T {
        self.row(y)[x * self.channels]
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

fn plane_len(width: usize, height: usize, channels: usize) -> MaskResult<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| MaskError::validation("plane size overflow"))
}

/// Numeric interface over the sample types a mask or frame can store.
///
/// Per-pixel math is written once against this trait and instantiated for `u8` and `f32`.
pub trait MaskSample: Copy + Default + PartialEq + PartialOrd + Send + Sync + std::fmt::Debug {
    /// Fully opaque mask value.
    const MAX: Self;
    /// Neutral chroma level for YUV layouts.
    const CHROMA_OFFSET: Self;

    fn to_f64(self) -> f64;

    /// Clamp into `[0, MAX]` and convert, rounding to nearest for integer samples.
    fn from_f64(v: f64) -> Self;

    /// `self * mask / MAX`.
    fn scale(self, mask: Self) -> Self;

    /// `self + CHROMA_OFFSET * (MAX - mask) / MAX`.
    fn chroma_bias(self, mask: Self) -> Self;

    /// Mask value written for a fully covered pixel at `opacity` percent.
    fn active(opacity: f64) -> Self;

    /// Box-filtered value for `filled` of `total` oversampled samples.
    ///
    /// Subtract modes return the exact complement of the multiply value.
    fn coverage(filled: u32, total: u32, active: Self, subtract: bool) -> Self;
}

impl MaskSample for u8 {
    const MAX: Self = u8::MAX;
    const CHROMA_OFFSET: Self = 0x80;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v.clamp(0.0, 255.0).round() as u8
    }

    fn scale(self, mask: Self) -> Self {
        (u32::from(self) * u32::from(mask) / 255) as u8
    }

    fn chroma_bias(self, mask: Self) -> Self {
        let bias = u32::from(Self::CHROMA_OFFSET) * (255 - u32::from(mask)) / 255;
        self.saturating_add(bias as u8)
    }

    fn active(opacity: f64) -> Self {
        (opacity.clamp(0.0, 100.0) / 100.0 * 255.0) as u8
    }

    fn coverage(filled: u32, total: u32, active: Self, subtract: bool) -> Self {
        let v = (filled * u32::from(active) / total.max(1)) as u8;
        if subtract { Self::MAX - v } else { v }
    }
}

impl MaskSample for f32 {
    const MAX: Self = 1.0;
    const CHROMA_OFFSET: Self = 0.5;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v.clamp(0.0, 1.0) as f32
    }

    fn scale(self, mask: Self) -> Self {
        self * mask
    }

    fn chroma_bias(self, mask: Self) -> Self {
        self + Self::CHROMA_OFFSET * (1.0 - mask)
    }

    fn active(opacity: f64) -> Self {
        (opacity.clamp(0.0, 100.0) / 100.0) as f32
    }

    fn coverage(filled: u32, total: u32, active: Self, subtract: bool) -> Self {
        let v = (f64::from(filled) * f64::from(active) / f64::from(total.max(1))) as f32;
        if subtract { Self::MAX - v } else { v }
    }
}

/// Storage class of a mask plane, derived from the output frame's color model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaskDepth {
    /// 8-bit integer opacity, `0..=255`.
    Int8,
    /// Float opacity, `0.0..=1.0`.
    Float,
}

/// Persistent single-channel mask plane.
#[derive(Clone, Debug, PartialEq)]
pub enum MaskPlane {
    U8(Plane<u8>),
    F32(Plane<f32>),
}

impl MaskPlane {
    /// Allocate a zeroed single-channel plane of the given depth.
    pub fn try_new(width: usize, height: usize, depth: MaskDepth) -> MaskResult<Self> {
        Ok(match depth {
            MaskDepth::Int8 => Self::U8(Plane::try_new(width, height, 1)?),
            MaskDepth::Float => Self::F32(Plane::try_new(width, height, 1)?),
        })
    }

    pub fn width(&self) -> usize {
        match self {
            Self::U8(p) => p.width(),
            Self::F32(p) => p.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::U8(p) => p.height(),
            Self::F32(p) => p.height(),
        }
    }

    pub fn depth(&self) -> MaskDepth {
        match self {
            Self::U8(_) => MaskDepth::Int8,
            Self::F32(_) => MaskDepth::Float,
        }
    }

    /// Reset every sample to zero (fully masked out).
    pub fn clear(&mut self) {
        match self {
            Self::U8(p) => p.fill(0),
            Self::F32(p) => p.fill(0.0),
        }
    }

    /// Sample at `(x, y)` normalized into `0.0..=1.0`.
    pub fn normalized(&self, x: usize, y: usize) -> f64 {
        match self {
            Self::U8(p) => f64::from(p.get(x, y)) / 255.0,
            Self::F32(p) => f64::from(p.get(x, y)),
        }
    }

    pub fn as_u8(&self) -> Option<&Plane<u8>> {
        match self {
            Self::U8(p) => Some(p),
            Self::F32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<&Plane<f32>> {
        match self {
            Self::F32(p) => Some(p),
            Self::U8(_) => None,
        }
    }
}

/// Oversampled 8-bit tag buffer owned by one rasterization package, plus the per-row edge
/// crossings collected while filling one outline.
#[derive(Debug)]
pub(crate) struct ScratchBuffer {
    plane: Plane<u8>,
    crossings: Vec<Vec<usize>>,
}

impl ScratchBuffer {
    pub(crate) fn new() -> Self {
        Self {
            plane: Plane {
                width: 0,
                height: 0,
                channels: 1,
                data: Vec::new(),
            },
            crossings: Vec::new(),
        }
    }

    /// Make the buffer exactly `width x height` and zero it, reallocating only on a size change.
    ///
    /// Also returns one empty crossing list per oversampled row.
    pub(crate) fn prepare(
        &mut self,
        width: usize,
        height: usize,
    ) -> MaskResult<(&mut Plane<u8>, &mut [Vec<usize>])> {
        if self.plane.width() != width || self.plane.height() != height {
            self.plane = Plane::try_new(width, height, 1)?;
        } else {
            self.plane.fill(0);
        }
        self.crossings.resize_with(height, Vec::new);
        for row in &mut self.crossings {
            row.clear();
        }
        Ok((&mut self.plane, &mut self.crossings))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/buffer.rs"]
mod tests;
