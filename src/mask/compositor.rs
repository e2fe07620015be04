//! Mask orchestration: cache check, persistent buffers and the phase sequence
//! RASTERIZE -> FEATHER-1 -> FEATHER-2 -> APPLY.

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{MaskError, MaskResult};
use crate::mask::apply::{ApplyLayout, apply_rows};
use crate::mask::buffer::{MaskDepth, MaskPlane, MaskSample, Plane, ScratchBuffer};
use crate::mask::feather::{FeatherKernel, feather_columns, feather_rows, scatter_columns};
use crate::mask::model::{GeometrySource, MaskMode, MaskParams, Submask, resolve};
use crate::mask::raster::{Outline, RasterParams, rasterize_package, tessellate};
use crate::render::frame::{Frame, FrameData, PixelLayout, Residency};
use crate::render::pool::{WorkerPool, partition, split_rows_mut};
use std::ops::Range;

/// Options for [`MaskCompositor::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskCompositorOpts {
    /// Worker threads in the compositor's pool. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Packages per phase. `None` uses one package per worker thread.
    pub packages: Option<usize>,
}

/// What an [`MaskCompositor::apply`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskOutcome {
    /// Geometry or parameters changed; the mask was rebuilt and applied.
    Recomputed,
    /// The cached mask was applied as-is.
    Reused,
    /// Nothing to mask (mode `None` or no drawable submask); the frame is untouched.
    Bypassed,
    /// Multiply mode at zero opacity; the frame was cleared without building a mask.
    Cleared,
}

/// Per-instance counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskStats {
    pub recomputes: u64,
    pub reuses: u64,
    pub bypasses: u64,
    pub clears: u64,
}

/// Inputs the persistent mask was last built from.
#[derive(Clone, Debug)]
struct MaskSnapshot {
    width: usize,
    height: usize,
    depth: MaskDepth,
    params: MaskParams,
    submasks: Vec<Submask>,
}

impl MaskSnapshot {
    /// Why a mask built from `self` cannot serve `next`, or `None` when it can.
    fn invalidation(&self, next: &MaskSnapshot) -> Option<&'static str> {
        if self.width != next.width || self.height != next.height {
            return Some("dimensions changed");
        }
        if self.depth != next.depth {
            return Some("color model class changed");
        }
        if self.submasks.len() != next.submasks.len() {
            return Some("submask count changed");
        }
        if !self
            .submasks
            .iter()
            .zip(&next.submasks)
            .all(|(a, b)| a.equivalent(b))
        {
            return Some("submask points changed");
        }
        if !self.params.equivalent(&next.params) {
            return Some("mask parameters changed");
        }
        None
    }
}

/// Turns keyframed Bezier submasks into a soft-edged opacity mask and multiplies it into frames.
///
/// The mask and its intermediate buffers persist between calls and are only rebuilt when the
/// resolved geometry, parameters or frame format change. Output does not depend on the number
/// of worker threads or packages.
pub struct MaskCompositor {
    pool: WorkerPool,
    packages: usize,
    mask: Option<MaskPlane>,
    feather_src: Option<MaskPlane>,
    scratch: Vec<ScratchBuffer>,
    snapshot: Option<MaskSnapshot>,
    stats: MaskStats,
}

impl MaskCompositor {
    pub fn new(opts: MaskCompositorOpts) -> MaskResult<Self> {
        if opts.packages == Some(0) {
            return Err(MaskError::validation(
                "mask compositor 'packages' must be >= 1 when set",
            ));
        }
        let pool = WorkerPool::new(opts.threads)?;
        let packages = opts.packages.unwrap_or_else(|| pool.threads()).max(1);
        Ok(Self {
            pool,
            packages,
            mask: None,
            feather_src: None,
            scratch: Vec::new(),
            snapshot: None,
            stats: MaskStats::default(),
        })
    }

    /// Packages each phase is split into.
    pub fn packages(&self) -> usize {
        self.packages
    }

    pub fn stats(&self) -> MaskStats {
        self.stats
    }

    /// The persistent mask plane, once one has been computed.
    pub fn mask(&self) -> Option<&MaskPlane> {
        self.mask.as_ref()
    }

    /// Drop every cached buffer; the next `apply` recomputes from scratch.
    pub fn reset(&mut self) {
        self.mask = None;
        self.feather_src = None;
        self.scratch.clear();
        self.snapshot = None;
    }

    /// Resolve the mask at `at` and multiply it into `frame` in place.
    ///
    /// Blocks until every phase has finished. GPU-resident frames get their mask computed but
    /// are not composited here.
    #[tracing::instrument(skip(self, frame, source), fields(width = frame.width(), height = frame.height()))]
    pub fn apply(
        &mut self,
        frame: &mut Frame,
        at: FrameIndex,
        source: &dyn GeometrySource,
        mode: MaskMode,
    ) -> MaskResult<MaskOutcome> {
        let model = frame.model();
        let layout = model
            .layout()
            .ok_or(MaskError::UnsupportedFormat(model))?;
        let (params, submasks) = resolve(source, at, mode)?;

        if mode == MaskMode::None || !submasks.iter().any(|s| s.points.len() >= 2) {
            tracing::debug!(?mode, submasks = submasks.len(), "mask bypassed");
            self.stats.bypasses += 1;
            return Ok(MaskOutcome::Bypassed);
        }
        if params.opacity <= 0.0 && !mode.is_subtract() {
            tracing::debug!(?mode, "zero opacity, clearing frame");
            self.stats.clears += 1;
            if frame.residency == Residency::Ram {
                frame.clear();
            }
            return Ok(MaskOutcome::Cleared);
        }

        let next = MaskSnapshot {
            width: frame.width(),
            height: frame.height(),
            depth: model.mask_depth(),
            params,
            submasks,
        };
        let reason = match &self.snapshot {
            Some(prev) => prev.invalidation(&next),
            None => Some("no cached mask"),
        };

        let outcome = match reason {
            None => {
                self.stats.reuses += 1;
                MaskOutcome::Reused
            }
            Some(reason) => {
                tracing::debug!(reason, "recomputing mask");
                self.snapshot = None;
                self.recompute(&next)?;
                self.snapshot = Some(next);
                self.stats.recomputes += 1;
                MaskOutcome::Recomputed
            }
        };

        if frame.residency == Residency::Ram {
            self.composite(frame, layout)?;
        }
        Ok(outcome)
    }

    fn ensure_buffers(&mut self, width: usize, height: usize, depth: MaskDepth) -> MaskResult<()> {
        let fits = |p: &Option<MaskPlane>| {
            p.as_ref().is_some_and(|p| {
                p.width() == width && p.height() == height && p.depth() == depth
            })
        };
        if !fits(&self.mask) || !fits(&self.feather_src) {
            tracing::debug!(width, height, ?depth, "allocating mask buffers");
            self.mask = None;
            self.feather_src = None;
            self.mask = Some(MaskPlane::try_new(width, height, depth)?);
            self.feather_src = Some(MaskPlane::try_new(width, height, depth)?);
        }
        if self.scratch.len() != self.packages {
            self.scratch.resize_with(self.packages, ScratchBuffer::new);
        }
        Ok(())
    }

    fn recompute(&mut self, next: &MaskSnapshot) -> MaskResult<()> {
        self.ensure_buffers(next.width, next.height, next.depth)?;

        let params = next.params;
        let kernel = FeatherKernel::new(params.feather);
        let outlines = tessellate(&next.submasks, params.mode)?;
        let raster = RasterParams {
            mode: params.mode,
            opacity: params.opacity,
            path_radius: params.path_radius,
            width: next.width,
        };
        let rows = partition(next.height, self.packages);

        let (Some(mask), Some(feather_src)) = (self.mask.as_mut(), self.feather_src.as_mut())
        else {
            return Err(MaskError::evaluation("mask buffers missing after allocation"));
        };
        // Feathering must start from the unsoftened geometry, so rasterize into the source plane.
        let target = if kernel.is_some() {
            &mut *feather_src
        } else {
            &mut *mask
        };
        target.clear();

        tracing::trace!(packages = rows.len(), "rasterize phase");
        match target {
            MaskPlane::U8(p) => rasterize_phase(&self.pool, &mut self.scratch, p, &rows, &outlines, &raster)?,
            MaskPlane::F32(p) => rasterize_phase(&self.pool, &mut self.scratch, p, &rows, &outlines, &raster)?,
        }

        if let Some(kernel) = kernel {
            tracing::trace!(feather = params.feather, "feather phases");
            match (&*feather_src, mask) {
                (MaskPlane::U8(src), MaskPlane::U8(dst)) => {
                    feather_phases(&self.pool, src, dst, &kernel, self.packages)?
                }
                (MaskPlane::F32(src), MaskPlane::F32(dst)) => {
                    feather_phases(&self.pool, src, dst, &kernel, self.packages)?
                }
                _ => return Err(MaskError::evaluation("feather planes differ in depth")),
            }
        }
        Ok(())
    }

    fn composite(&self, frame: &mut Frame, layout: PixelLayout) -> MaskResult<()> {
        let mask = self
            .mask
            .as_ref()
            .ok_or_else(|| MaskError::evaluation("apply requested without a mask"))?;
        let rows = partition(frame.height(), self.packages);
        let layout = ApplyLayout::from(layout);
        tracing::trace!(packages = rows.len(), "apply phase");
        match (frame.data_mut(), mask) {
            (FrameData::U8(px), MaskPlane::U8(m)) => apply_phase(&self.pool, px, m, &rows, layout),
            (FrameData::F32(px), MaskPlane::F32(m)) => apply_phase(&self.pool, px, m, &rows, layout),
            _ => Err(MaskError::evaluation(
                "mask depth does not match frame samples",
            )),
        }
    }
}

fn rasterize_phase<T: MaskSample>(
    pool: &WorkerPool,
    scratch: &mut [ScratchBuffer],
    target: &mut Plane<T>,
    rows: &[Range<usize>],
    outlines: &[Outline],
    params: &RasterParams,
) -> MaskResult<()> {
    let width = target.width();
    let blocks = split_rows_mut(target.as_mut_slice(), width, rows)?;
    let packages = rows
        .iter()
        .cloned()
        .zip(blocks)
        .zip(scratch.iter_mut())
        .collect::<Vec<_>>();
    pool.try_run(packages, |((rows, block), scratch)| {
        rasterize_package(scratch, rows, block, outlines, params)
    })?;
    Ok(())
}

/// Columns of `src` into `dst`, then rows of `dst` in place; each pass is its own barrier.
fn feather_phases<T: MaskSample>(
    pool: &WorkerPool,
    src: &Plane<T>,
    dst: &mut Plane<T>,
    kernel: &FeatherKernel,
    packages: usize,
) -> MaskResult<()> {
    let cols = partition(src.width(), packages);
    let blocks = pool.run(cols.clone(), |c| feather_columns(src, c, kernel));
    for (c, block) in cols.into_iter().zip(&blocks) {
        scatter_columns(dst, c, block);
    }

    let width = dst.width();
    let rows = partition(dst.height(), packages);
    let row_blocks = split_rows_mut(dst.as_mut_slice(), width, &rows)?;
    pool.run(row_blocks, |block| feather_rows(block, width, kernel));
    Ok(())
}

fn apply_phase<T: MaskSample>(
    pool: &WorkerPool,
    pixels: &mut Plane<T>,
    mask: &Plane<T>,
    rows: &[Range<usize>],
    layout: ApplyLayout,
) -> MaskResult<()> {
    let stride = pixels.stride();
    let mask_width = mask.width();
    let blocks = split_rows_mut(pixels.as_mut_slice(), stride, rows)?;
    let packages = rows.iter().cloned().zip(blocks).collect::<Vec<_>>();
    pool.run(packages, |(rows, block)| {
        let m = &mask.as_slice()[rows.start * mask_width..rows.end * mask_width];
        apply_rows(block, m, layout);
    });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/mask/compositor.rs"]
mod tests;
