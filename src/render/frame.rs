//! Frame buffer contract consumed and mutated by the compositor.

use crate::foundation::error::{MaskError, MaskResult};
use crate::mask::buffer::{MaskDepth, MaskSample, Plane};

/// Pixel layout tag of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColorModel {
    Rgb888,
    Rgba8888,
    Yuv888,
    Yuva8888,
    RgbFloat,
    RgbaFloat,
    /// Single-channel 8-bit alpha.
    A8,
    /// Single-channel float alpha.
    AFloat,
}

/// Closed set of layouts the apply stage knows how to composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Three 8-bit channels; `yuv` re-biases chroma toward neutral.
    U8x3 { yuv: bool },
    /// Four 8-bit channels, alpha last.
    U8x4,
    F32x3,
    /// Four float channels, alpha last.
    F32x4,
}

impl ColorModel {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb888 | Self::Yuv888 | Self::RgbFloat => 3,
            Self::Rgba8888 | Self::Yuva8888 | Self::RgbaFloat => 4,
            Self::A8 | Self::AFloat => 1,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::RgbFloat | Self::RgbaFloat | Self::AFloat)
    }

    /// Storage class for a mask covering frames of this model.
    pub fn mask_depth(self) -> MaskDepth {
        if self.is_float() {
            MaskDepth::Float
        } else {
            MaskDepth::Int8
        }
    }

    /// Apply-stage layout, or `None` when masks cannot be composited onto this model.
    pub fn layout(self) -> Option<PixelLayout> {
        match self {
            Self::Rgb888 => Some(PixelLayout::U8x3 { yuv: false }),
            Self::Yuv888 => Some(PixelLayout::U8x3 { yuv: true }),
            Self::Rgba8888 | Self::Yuva8888 => Some(PixelLayout::U8x4),
            Self::RgbFloat => Some(PixelLayout::F32x3),
            Self::RgbaFloat => Some(PixelLayout::F32x4),
            Self::A8 | Self::AFloat => None,
        }
    }
}

/// Where the authoritative copy of a frame's pixels currently lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Residency {
    #[default]
    Ram,
    /// Pixels live in a GPU texture; the GPU path composites the mask itself.
    Gpu,
}

/// Sample storage of a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameData {
    U8(Plane<u8>),
    F32(Plane<f32>),
}

/// Row-major video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    model: ColorModel,
    pub residency: Residency,
    data: FrameData,
}

impl Frame {
    /// Allocate a zeroed frame.
    pub fn new(width: usize, height: usize, model: ColorModel) -> MaskResult<Self> {
        let channels = model.channels();
        let data = if model.is_float() {
            FrameData::F32(Plane::try_new(width, height, channels)?)
        } else {
            FrameData::U8(Plane::try_new(width, height, channels)?)
        };
        Ok(Self {
            model,
            residency: Residency::Ram,
            data,
        })
    }

    /// Wrap interleaved 8-bit samples.
    pub fn from_u8(width: usize, height: usize, model: ColorModel, data: Vec<u8>) -> MaskResult<Self> {
        if model.is_float() {
            return Err(MaskError::validation(format!(
                "{model:?} frames store float samples"
            )));
        }
        Ok(Self {
            model,
            residency: Residency::Ram,
            data: FrameData::U8(Plane::from_vec(width, height, model.channels(), data)?),
        })
    }

    /// Wrap interleaved float samples.
    pub fn from_f32(
        width: usize,
        height: usize,
        model: ColorModel,
        data: Vec<f32>,
    ) -> MaskResult<Self> {
        if !model.is_float() {
            return Err(MaskError::validation(format!(
                "{model:?} frames store 8-bit samples"
            )));
        }
        Ok(Self {
            model,
            residency: Residency::Ram,
            data: FrameData::F32(Plane::from_vec(width, height, model.channels(), data)?),
        })
    }

    pub fn width(&self) -> usize {
        match &self.data {
            FrameData::U8(p) => p.width(),
            FrameData::F32(p) => p.width(),
        }
    }

    pub fn height(&self) -> usize {
        match &self.data {
            FrameData::U8(p) => p.height(),
            FrameData::F32(p) => p.height(),
        }
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    pub fn data(&self) -> &FrameData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut FrameData {
        &mut self.data
    }

    /// Make every pixel transparent black; YUV chroma goes to its neutral level.
    pub fn clear(&mut self) {
        let yuv = matches!(self.model, ColorModel::Yuv888 | ColorModel::Yuva8888);
        match &mut self.data {
            FrameData::U8(p) => {
                p.fill(0);
                if yuv {
                    let channels = p.channels();
                    for px in p.as_mut_slice().chunks_exact_mut(channels) {
                        px[1] = u8::CHROMA_OFFSET;
                        px[2] = u8::CHROMA_OFFSET;
                    }
                }
            }
            FrameData::F32(p) => p.fill(0.0),
        }
    }

    /// Fill every pixel with `px`, which must have one sample per channel.
    pub fn fill_u8(&mut self, px: &[u8]) -> MaskResult<()> {
        let FrameData::U8(plane) = &mut self.data else {
            return Err(MaskError::validation("fill_u8 on a float frame"));
        };
        fill_pixels(plane, px)
    }

    /// Fill every pixel with `px`, which must have one sample per channel.
    pub fn fill_f32(&mut self, px: &[f32]) -> MaskResult<()> {
        let FrameData::F32(plane) = &mut self.data else {
            return Err(MaskError::validation("fill_f32 on an 8-bit frame"));
        };
        fill_pixels(plane, px)
    }
}

fn fill_pixels<T: Copy + Default>(plane: &mut Plane<T>, px: &[T]) -> MaskResult<()> {
    if px.len() != plane.channels() {
        return Err(MaskError::validation(format!(
            "pixel has {} samples, frame has {} channels",
            px.len(),
            plane.channels()
        )));
    }
    for chunk in plane.as_mut_slice().chunks_exact_mut(px.len()) {
        chunk.copy_from_slice(px);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
