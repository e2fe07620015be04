//! RASTERIZE phase: Bezier tessellation, oversampled line drawing, parity fill and box-filter
//! downsampling into the mask plane.

use crate::foundation::error::{MaskError, MaskResult};
use crate::mask::buffer::{MaskSample, Plane, ScratchBuffer};
use crate::mask::model::{ControlPoint, MaskMode, Submask};
use kurbo::{CubicBez, ParamCurve};
use std::ops::Range;

/// Integer up-scaling ratio used to approximate anti-aliasing.
pub const OVERSAMPLE: usize = 8;

const OVERSAMPLE_I: i64 = OVERSAMPLE as i64;
const OVERSAMPLE_AREA: u32 = (OVERSAMPLE * OVERSAMPLE) as u32;

/// Endpoint in absolute oversampled pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OsPoint {
    pub(crate) x: i64,
    pub(crate) y: i64,
}

impl OsPoint {
    fn from_project(x: f64, y: f64) -> Self {
        Self {
            x: (x * OVERSAMPLE as f64).floor() as i64,
            y: (y * OVERSAMPLE as f64).floor() as i64,
        }
    }
}

/// Tessellated line segments of one submask plus the tag its pixels carry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Outline {
    pub(crate) pixel_value: u8,
    pub(crate) lines: Vec<(OsPoint, OsPoint)>,
}

/// Immutable inputs shared by every RASTERIZE package.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RasterParams {
    pub(crate) mode: MaskMode,
    pub(crate) opacity: f64,
    pub(crate) path_radius: f64,
    /// Mask width in pixels.
    pub(crate) width: usize,
}

/// Turn every drawable submask into oversampled line segments.
///
/// Submasks with fewer than two points or a non-finite coordinate are skipped; they still consume
/// their tag so tags stay stable across frames.
pub(crate) fn tessellate(submasks: &[Submask], mode: MaskMode) -> MaskResult<Vec<Outline>> {
    let mut outlines = Vec::with_capacity(submasks.len());
    for (k, submask) in submasks.iter().enumerate() {
        let pixel_value = u8::try_from(k + 1)
            .map_err(|_| MaskError::validation(format!("submask {k} has no free pixel tag")))?;
        let points = &submask.points;
        if points.len() < 2 || !(mode.is_alpha() || mode.is_path()) {
            continue;
        }
        if !points.iter().all(ControlPoint::is_finite) {
            tracing::debug!(submask = k, "skipping submask with non-finite coordinates");
            continue;
        }

        let segments = if mode.is_path() {
            points.len() - 1
        } else {
            points.len()
        };
        let mut lines = Vec::new();
        for i in 0..segments {
            let from = &points[i];
            let to = &points[(i + 1) % points.len()];
            tessellate_segment(from, to, &mut lines)?;
        }
        outlines.push(Outline { pixel_value, lines });
    }
    Ok(outlines)
}

fn tessellate_segment(
    from: &ControlPoint,
    to: &ControlPoint,
    lines: &mut Vec<(OsPoint, OsPoint)>,
) -> MaskResult<()> {
    let straight = from.control_out_x == 0.0
        && from.control_out_y == 0.0
        && to.control_in_x == 0.0
        && to.control_in_y == 0.0;
    let steps = if straight {
        1
    } else {
        (from.position().distance(to.position()).round() as usize).max(1)
    };
    lines.try_reserve(steps).map_err(|e| {
        MaskError::allocation(format!("failed to tessellate segment into {steps} lines: {e}"))
    })?;

    let curve = CubicBez::new(
        from.position(),
        from.out_handle(),
        to.in_handle(),
        to.position(),
    );
    let mut prev = OsPoint::from_project(from.x, from.y);
    for j in 1..=steps {
        let p = curve.eval(j as f64 / steps as f64);
        let next = OsPoint::from_project(p.x, p.y);
        lines.push((prev, next));
        prev = next;
    }
    Ok(())
}

/// Rasterize `rows` of the mask into `out`, the matching row block of a single-channel plane.
pub(crate) fn rasterize_package<T: MaskSample>(
    scratch: &mut ScratchBuffer,
    rows: Range<usize>,
    out: &mut [T],
    outlines: &[Outline],
    params: &RasterParams,
) -> MaskResult<()> {
    let width = params.width;
    let height = rows.len();
    if out.len() != width * height {
        return Err(MaskError::evaluation(format!(
            "raster package {rows:?} expects {} samples, got {}",
            width * height,
            out.len()
        )));
    }
    if width == 0 || height == 0 {
        return Ok(());
    }

    let (plane, crossings) = scratch.prepare(width * OVERSAMPLE, height * OVERSAMPLE)?;
    let origin = rows.start as i64 * OVERSAMPLE_I;
    let radius = (params.path_radius * OVERSAMPLE as f64) as i64;

    for outline in outlines {
        if params.mode.is_path() {
            for &(a, b) in &outline.lines {
                draw_thick_line(plane, origin, a, b, radius, outline.pixel_value);
            }
        } else {
            for &(a, b) in &outline.lines {
                draw_toggle_line(crossings, origin, plane.width(), a, b);
            }
            for (y, row_crossings) in crossings.iter_mut().enumerate() {
                parity_fill_row(plane.row_mut(y), row_crossings, outline.pixel_value);
            }
        }
    }

    let active = T::active(params.opacity);
    downsample(plane, out, width, active, params.mode.is_subtract());
    Ok(())
}

/// Record one crossing per oversampled row in `[a.y, b.y)`; horizontal lines record nothing.
///
/// `crossings` holds one list per plane row and `origin` is the absolute oversampled row of the
/// first one. Crossing columns are clamped into `0..=width`, so an edge at or past the right border
/// closes its span after the last column.
pub(crate) fn draw_toggle_line(
    crossings: &mut [Vec<usize>],
    origin: i64,
    width: usize,
    a: OsPoint,
    b: OsPoint,
) {
    let (top, bottom) = if b.y < a.y { (b, a) } else { (a, b) };
    if top.y == bottom.y {
        return;
    }
    let slope = (bottom.x as f64 - top.x as f64) / (bottom.y as f64 - top.y as f64);
    let start = top.y.max(origin);
    let end = bottom.y.min(origin.saturating_add(crossings.len() as i64));

    for y in start..end {
        let x = ((y as f64 - top.y as f64) * slope + top.x as f64).floor();
        let x = x.clamp(0.0, width as f64) as usize;
        crossings[(y - origin) as usize].push(x);
    }
}

/// Paint a stroke of half-width `radius` around the segment.
pub(crate) fn draw_thick_line(
    plane: &mut Plane<u8>,
    origin: i64,
    a: OsPoint,
    b: OsPoint,
    radius: i64,
    pixel_value: u8,
) {
    if radius <= 0 {
        return;
    }
    let (top, bottom) = if b.y < a.y { (b, a) } else { (a, b) };
    if top.y == bottom.y {
        let (x1, x2) = (top.x.min(bottom.x), top.x.max(bottom.x));
        fill_rect(
            plane,
            origin,
            top.y.saturating_sub(radius)..top.y.saturating_add(radius),
            x1.saturating_sub(radius)..x2.saturating_add(radius),
            pixel_value,
        );
        return;
    }

    let slope = (bottom.x as f64 - top.x as f64) / (bottom.y as f64 - top.y as f64);
    let x_at = |y: i64| ((y as f64 - top.y as f64) * slope + top.x as f64).floor() as i64;
    let start = top.y.max(origin - radius);
    let end = bottom.y.min(origin + plane.height() as i64 + radius);
    for y in start..end {
        let (x1, x2) = (x_at(y), x_at(y + 1));
        let (x1, x2) = (x1.min(x2), x1.max(x2));
        fill_rect(
            plane,
            origin,
            y - radius..y + radius,
            x1.saturating_sub(radius)..x2.saturating_add(radius),
            pixel_value,
        );
    }
}

fn fill_rect(plane: &mut Plane<u8>, origin: i64, ys: Range<i64>, xs: Range<i64>, value: u8) {
    let y0 = (ys.start - origin).max(0);
    let y1 = (ys.end - origin).min(plane.height() as i64);
    let x0 = xs.start.max(0);
    let x1 = xs.end.min(plane.width() as i64);
    if y0 >= y1 || x0 >= x1 {
        return;
    }
    for y in y0..y1 {
        plane.row_mut(y as usize)[x0 as usize..x1 as usize].fill(value);
    }
}

/// Fill one scanline with `pixel_value` between matched pairs of `crossings`, then clear the list.
///
/// Spans are half-open `[open, close)`. Crossings at the same column cancel like toggled pixels,
/// and an odd count leaves the last crossing unmatched and ignored. Pixels outside the spans keep
/// whatever earlier outlines wrote.
pub(crate) fn parity_fill_row(row: &mut [u8], crossings: &mut Vec<usize>, pixel_value: u8) {
    crossings.sort_unstable();
    let mut kept = 0;
    for i in 0..crossings.len() {
        let x = crossings[i];
        if kept > 0 && crossings[kept - 1] == x {
            kept -= 1;
        } else {
            crossings[kept] = x;
            kept += 1;
        }
    }
    crossings.truncate(kept);

    for span in crossings.chunks_exact(2) {
        let end = span[1].min(row.len());
        if span[0] < end {
            row[span[0]..end].fill(pixel_value);
        }
    }
    crossings.clear();
}

/// Box-filter `OVERSAMPLE x OVERSAMPLE` blocks of `plane` into `out` (`width` samples per row).
pub(crate) fn downsample<T: MaskSample>(
    plane: &Plane<u8>,
    out: &mut [T],
    width: usize,
    active: T,
    subtract: bool,
) {
    for (i, out_row) in out.chunks_exact_mut(width).enumerate() {
        let block_rows = i * OVERSAMPLE..(i + 1) * OVERSAMPLE;
        for (j, sample) in out_row.iter_mut().enumerate() {
            let cols = j * OVERSAMPLE..(j + 1) * OVERSAMPLE;
            let filled = block_rows
                .clone()
                .map(|y| plane.row(y)[cols.clone()].iter().filter(|&&v| v != 0).count())
                .sum::<usize>() as u32;
            *sample = T::coverage(filled, OVERSAMPLE_AREA, active, subtract);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/raster.rs"]
mod tests;
