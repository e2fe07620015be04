//! APPLY phase: multiply the finished mask into the output frame.

use crate::mask::buffer::MaskSample;
use crate::render::frame::PixelLayout;

/// Channel handling derived from a [`PixelLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ApplyLayout {
    pub(crate) channels: usize,
    /// Only the trailing alpha channel is attenuated.
    pub(crate) alpha_only: bool,
    /// Chroma channels 1 and 2 drift toward neutral as the mask closes.
    pub(crate) yuv: bool,
}

impl From<PixelLayout> for ApplyLayout {
    fn from(layout: PixelLayout) -> Self {
        match layout {
            PixelLayout::U8x3 { yuv } => Self {
                channels: 3,
                alpha_only: false,
                yuv,
            },
            PixelLayout::F32x3 => Self {
                channels: 3,
                alpha_only: false,
                yuv: false,
            },
            PixelLayout::U8x4 | PixelLayout::F32x4 => Self {
                channels: 4,
                alpha_only: true,
                yuv: false,
            },
        }
    }
}

/// Composite one row block: `pixels` holds interleaved samples, `mask` one sample per pixel.
pub(crate) fn apply_rows<T: MaskSample>(pixels: &mut [T], mask: &[T], layout: ApplyLayout) {
    let alpha = layout.channels - 1;
    for (px, &m) in pixels.chunks_exact_mut(layout.channels).zip(mask) {
        if layout.alpha_only {
            px[alpha] = px[alpha].scale(m);
            continue;
        }
        for c in px.iter_mut() {
            *c = c.scale(m);
        }
        if layout.yuv {
            px[1] = px[1].chroma_bias(m);
            px[2] = px[2].chroma_bias(m);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/apply.rs"]
mod tests;
