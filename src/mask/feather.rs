//! FEATHER phases: separable recursive (IIR) Gaussian approximation.
//!
//! Each 1-D line is filtered by a causal pass running forward and an anti-causal pass running
//! backward; their sum approximates convolution with a Gaussian whose standard deviation is
//! derived from the feather radius. Accumulation is always `f64`.

use crate::mask::buffer::{MaskSample, Plane};
use std::ops::Range;

/// Recursive filter coefficients for one feather radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FeatherKernel {
    n_p: [f64; 5],
    n_m: [f64; 5],
    d_p: [f64; 5],
    d_m: [f64; 5],
    bd_p: [f64; 5],
    bd_m: [f64; 5],
}

impl FeatherKernel {
    /// Derive coefficients for `feather`; `None` when there is nothing to blur.
    pub(crate) fn new(feather: f64) -> Option<Self> {
        if !feather.is_finite() || feather <= 0.0 {
            return None;
        }

        // Radius at which the Gaussian falls to 1/255.
        let std_dev = (-(feather * feather) / (2.0 * (1.0f64 / 255.0).ln())).sqrt();
        let div = (2.0 * std::f64::consts::PI).sqrt() * std_dev;
        let b0 = -1.783 / std_dev;
        let b1 = -1.723 / std_dev;
        let w0 = 0.6318 / std_dev;
        let w1 = 1.997 / std_dev;
        let a0 = 1.6803 / div;
        let a1 = 3.735 / div;
        let c0 = -0.6803 / div;
        let c1 = -0.2598 / div;

        let (e0, e1) = (b0.exp(), b1.exp());
        let (cw0, sw0) = (w0.cos(), w0.sin());
        let (cw1, sw1) = (w1.cos(), w1.sin());

        let mut n_p = [0.0; 5];
        n_p[0] = a0 + c0;
        n_p[1] = e1 * (c1 * sw1 - (c0 + 2.0 * a0) * cw1) + e0 * (a1 * sw0 - (2.0 * c0 + a0) * cw0);
        n_p[2] = 2.0 * (b0 + b1).exp() * ((a0 + c0) * cw1 * cw0 - a1 * cw1 * sw0 - c1 * cw0 * sw1)
            + c0 * (2.0 * b0).exp()
            + a0 * (2.0 * b1).exp();
        n_p[3] = (b1 + 2.0 * b0).exp() * (c1 * sw1 - c0 * cw1)
            + (b0 + 2.0 * b1).exp() * (a1 * sw0 - a0 * cw0);

        let mut d_p = [0.0; 5];
        d_p[1] = -2.0 * e1 * cw1 - 2.0 * e0 * cw0;
        d_p[2] = 4.0 * cw1 * cw0 * (b0 + b1).exp() + (2.0 * b1).exp() + (2.0 * b0).exp();
        d_p[3] = -2.0 * cw0 * (b0 + 2.0 * b1).exp() - 2.0 * cw1 * (b1 + 2.0 * b0).exp();
        d_p[4] = (2.0 * b0 + 2.0 * b1).exp();

        let d_m = d_p;
        let mut n_m = [0.0; 5];
        for i in 1..5 {
            n_m[i] = n_p[i] - d_p[i] * n_p[0];
        }

        // Steady-state gains stand in for the history missing before each line's edges.
        let sum_d = 1.0 + d_p.iter().sum::<f64>();
        let gain_p = n_p.iter().sum::<f64>() / sum_d;
        let gain_m = n_m.iter().sum::<f64>() / sum_d;
        let bd_p = d_p.map(|d| d * gain_p);
        let bd_m = d_m.map(|d| d * gain_m);

        Some(Self {
            n_p,
            n_m,
            d_p,
            d_m,
            bd_p,
            bd_m,
        })
    }
}

/// Reusable per-package line buffers.
#[derive(Debug, Default)]
pub(crate) struct LineScratch {
    src: Vec<f64>,
    val_p: Vec<f64>,
    val_m: Vec<f64>,
}

impl LineScratch {
    fn load(&mut self, len: usize) {
        self.src.clear();
        self.val_p.clear();
        self.val_p.resize(len, 0.0);
        self.val_m.clear();
        self.val_m.resize(len, 0.0);
    }
}

/// Blur the samples in `scratch.src` and hand each result (clamped to `[0, max]`) to `out`.
fn blur_strip(kernel: &FeatherKernel, scratch: &mut LineScratch, max: f64, mut out: impl FnMut(usize, f64)) {
    let LineScratch { src, val_p, val_m } = scratch;
    let size = src.len();
    if size == 0 {
        return;
    }
    let initial_p = src[0];
    let initial_m = src[size - 1];

    for k in 0..size {
        let m = size - 1 - k;
        let terms = k.min(4);

        let mut acc_p = kernel.n_p[0] * src[k];
        let mut acc_m = kernel.n_m[0] * src[m];
        for l in 1..=terms {
            acc_p += kernel.n_p[l] * src[k - l] - kernel.d_p[l] * val_p[k - l];
            acc_m += kernel.n_m[l] * src[m + l] - kernel.d_m[l] * val_m[m + l];
        }
        for l in terms + 1..5 {
            acc_p += (kernel.n_p[l] - kernel.bd_p[l]) * initial_p;
            acc_m += (kernel.n_m[l] - kernel.bd_m[l]) * initial_m;
        }
        val_p[k] = acc_p;
        val_m[m] = acc_m;
    }

    for i in 0..size {
        out(i, (val_p[i] + val_m[i]).clamp(0.0, max));
    }
}

/// Pass 1: blur columns `cols` of `src`, returning them column-major (`height` samples each).
pub(crate) fn feather_columns<T: MaskSample>(
    src: &Plane<T>,
    cols: Range<usize>,
    kernel: &FeatherKernel,
) -> Vec<T> {
    let height = src.height();
    let max = T::MAX.to_f64();
    let mut scratch = LineScratch::default();
    let mut block = Vec::with_capacity(cols.len() * height);
    for x in cols {
        scratch.load(height);
        scratch.src.extend((0..height).map(|y| src.get(x, y).to_f64()));
        blur_strip(kernel, &mut scratch, max, |_, v| block.push(T::from_f64(v)));
    }
    block
}

/// Write a column-major block produced by [`feather_columns`] back into `dst`.
pub(crate) fn scatter_columns<T: MaskSample>(dst: &mut Plane<T>, cols: Range<usize>, block: &[T]) {
    let height = dst.height();
    if height == 0 {
        return;
    }
    for (x, column) in cols.zip(block.chunks_exact(height)) {
        for (y, &v) in column.iter().enumerate() {
            dst.row_mut(y)[x] = v;
        }
    }
}

/// Pass 2: blur every row of a row block (`width` samples per row) in place.
pub(crate) fn feather_rows<T: MaskSample>(rows: &mut [T], width: usize, kernel: &FeatherKernel) {
    if width == 0 {
        return;
    }
    let max = T::MAX.to_f64();
    let mut scratch = LineScratch::default();
    for row in rows.chunks_exact_mut(width) {
        scratch.load(width);
        scratch.src.extend(row.iter().map(|v| v.to_f64()));
        blur_strip(kernel, &mut scratch, max, |i, v| row[i] = T::from_f64(v));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/feather.rs"]
mod tests;
