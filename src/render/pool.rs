//! Fixed-size worker pool running synchronous fan-out/fan-in phases.

use crate::foundation::error::{MaskError, MaskResult};
use rayon::prelude::*;
use std::ops::Range;

/// Dedicated thread pool reused across `apply` invocations.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers (`None` uses rayon's default, the core count).
    pub fn new(threads: Option<usize>) -> MaskResult<Self> {
        Ok(Self {
            pool: build_thread_pool(threads)?,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` once per package and block until every package has finished.
    ///
    /// Results come back in package order regardless of which worker ran what.
    pub fn run<P, R, F>(&self, packages: Vec<P>, f: F) -> Vec<R>
    where
        P: Send,
        R: Send,
        F: Fn(P) -> R + Sync + Send,
    {
        self.pool
            .install(|| packages.into_par_iter().map(f).collect::<Vec<_>>())
    }

    /// Like [`WorkerPool::run`] for fallible packages; the first error in package order wins.
    pub fn try_run<P, R, F>(&self, packages: Vec<P>, f: F) -> MaskResult<Vec<R>>
    where
        P: Send,
        R: Send,
        F: Fn(P) -> MaskResult<R> + Sync + Send,
    {
        let results = self.run(packages, f);
        let mut out = Vec::with_capacity(results.len());
        for item in results {
            out.push(item?);
        }
        Ok(out)
    }
}

fn build_thread_pool(threads: Option<usize>) -> MaskResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MaskError::validation(
            "mask compositor 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mask-worker-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MaskError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

/// Evenly partition `0..len` into `count` contiguous ranges.
///
/// Range `i` is `[len*i/count, len*(i+1)/count)`. Ranges never overlap, leave no gaps and may be
/// empty when `count > len`.
pub fn partition(len: usize, count: usize) -> Vec<Range<usize>> {
    let count = count.max(1);
    (0..count)
        .map(|i| (len * i / count)..(len * (i + 1) / count))
        .collect()
}

/// Split row-major `data` into one mutable block per range of rows.
///
/// `ranges` must be sorted, contiguous and start at row 0, as produced by [`partition`].
pub fn split_rows_mut<'a, T>(
    data: &'a mut [T],
    stride: usize,
    ranges: &[Range<usize>],
) -> MaskResult<Vec<&'a mut [T]>> {
    let mut out = Vec::with_capacity(ranges.len());
    let mut rest = data;
    let mut cursor = 0usize;
    for r in ranges {
        if r.start != cursor || r.end < r.start {
            return Err(MaskError::evaluation(format!(
                "row packages must be contiguous: expected start {cursor}, got {r:?}"
            )));
        }
        let take = (r.end - r.start)
            .checked_mul(stride)
            .filter(|&n| n <= rest.len())
            .ok_or_else(|| MaskError::evaluation("row package exceeds buffer"))?;
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(take);
        out.push(head);
        rest = tail;
        cursor = r.end;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
