//! C7 — parallel dispatcher: fans a full column-pair search out across a
//! private rayon pool, one claimed outer column `j` per worker, reusing
//! that column's segment tree across every `i < j` pair it evaluates
//! (spec §4.6).
//!
//! The single-threaded path (`num_threads < 2`) visits columns in
//! ascending order and is the canonical, reproducible ordering (spec §5).
//! The multi-threaded path claims columns off a shared cursor so workers
//! never coordinate on anything finer than "which column is mine" — no
//! locking happens inside a claimed column's own pair loop.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::ThreadPoolBuilder;

use crate::config::{Mode, SearchParams};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::feature_map::FeatureMap;
use crate::interval;
use crate::leaf;
use crate::pair;
use crate::tree::classification::ClassificationTree;
use crate::tree::numeric::NumericTree;

/// Claims the highest-numbered unclaimed column first, down to 1 (column
/// 0 never anchors a pair as the inner index), mirroring the original's
/// descending `for(j=atts-1; j>0; j--)` claim loop. `AtomicUsize` cursor
/// plus a per-column `AtomicBool` guard the claim so two workers never
/// both claim the same `j`, even if the cursor races past columns a
/// faster worker already finished and released.
struct ClaimVector {
    claimed: Vec<AtomicBool>,
    cursor: AtomicUsize,
}

impl ClaimVector {
    fn new(cols: usize) -> Self {
        Self {
            claimed: (0..cols).map(|_| AtomicBool::new(false)).collect(),
            cursor: AtomicUsize::new(cols),
        }
    }

    fn claim_next(&self) -> Option<usize> {
        loop {
            let prev = self.cursor.fetch_sub(1, Ordering::Relaxed);
            if prev <= 1 {
                return None;
            }
            let j = prev - 1;
            if !self.claimed[j].swap(true, Ordering::AcqRel) {
                return Some(j);
            }
        }
    }
}

/// Runs `visit` over every outer column `1..cols`, single-threaded or
/// across a dedicated `num_threads`-worker rayon pool. `visit` must be
/// safe to call concurrently for distinct columns; `abort` is checked
/// before each column and set on the first error any worker reports.
fn run_over_columns<F>(cols: usize, num_threads: usize, abort: &AtomicBool, visit: F) -> Result<()>
where
    F: Fn(usize) -> Result<()> + Sync,
{
    if num_threads < 2 {
        for j in 1..cols {
            if abort.load(Ordering::Relaxed) {
                return Err(Error::Aborted);
            }
            visit(j)?;
        }
        return Ok(());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|_| Error::InvalidThreadCount { num_threads })?;

    let claims = ClaimVector::new(cols);
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    pool.scope(|scope| {
        for _ in 0..num_threads {
            scope.spawn(|_| {
                while let Some(j) = claims.claim_next() {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Err(err) = visit(j) {
                        *first_error.lock().unwrap() = Some(err);
                        abort.store(true, Ordering::Relaxed);
                        return;
                    }
                }
            });
        }
    });

    if let Some(err) = first_error.into_inner().unwrap() {
        return Err(err);
    }
    if abort.load(Ordering::Relaxed) {
        return Err(Error::Aborted);
    }
    Ok(())
}

/// Searches every column pair of a classification dataset. `sorted` holds
/// one ascending row permutation per column, already restricted to the
/// rows under search; `num_classes` is the number of distinct output
/// labels; `exclude_class`, if set, skips scoring that one label (used by
/// the decision-list builder to avoid rediscovering an already-accepted
/// class, spec §4.7).
///
/// On `Err(Error::Aborted)` any partial results are discarded, matching
/// spec §4.6's "discards whatever partial FeatureMap had been built".
pub fn run_classification(
    dataset: &dyn Dataset,
    sorted: &[Vec<u32>],
    params: SearchParams,
    num_classes: usize,
    exclude_class: Option<u32>,
    abort: &AtomicBool,
) -> Result<FeatureMap> {
    let cols = dataset.cols();
    let results = Mutex::new(FeatureMap::new(cols));

    run_over_columns(cols, params.num_threads, abort, |j| {
        let leaves_j = leaf::build_leaves(dataset, &sorted[j], j, params.bin_size);
        let mut tree = ClassificationTree::build(&leaves_j, num_classes);

        for i in 0..j {
            if abort.load(Ordering::Relaxed) {
                return Err(Error::Aborted);
            }
            let intervals = interval::build(dataset, &sorted[i], i, params.bin_size);
            let found = pair::evaluate_pair_classification(
                dataset,
                &sorted[i],
                &sorted[j],
                &intervals,
                &mut tree,
                i,
                j,
                params.support,
                params.purity,
                num_classes,
                exclude_class,
            );
            if !found.is_empty() {
                results.lock().unwrap().set(i, j, found);
            }
        }
        Ok(())
    })?;

    Ok(results.into_inner().unwrap())
}

/// Searches every column pair of a numeric-output dataset under `mode`'s
/// objective. See [`run_classification`] for the threading contract.
pub fn run_numeric(dataset: &dyn Dataset, sorted: &[Vec<u32>], params: SearchParams, abort: &AtomicBool) -> Result<FeatureMap> {
    let cols = dataset.cols();
    let results = Mutex::new(FeatureMap::new(cols));

    run_over_columns(cols, params.num_threads, abort, |j| {
        let leaves_j = leaf::build_leaves(dataset, &sorted[j], j, params.bin_size);
        let mut tree = NumericTree::build(&leaves_j);
        tree.set_mode(params.mode);

        for i in 0..j {
            if abort.load(Ordering::Relaxed) {
                return Err(Error::Aborted);
            }
            let intervals = interval::build(dataset, &sorted[i], i, params.bin_size);
            let found = pair::evaluate_pair_numeric(
                dataset,
                &sorted[i],
                &sorted[j],
                &intervals,
                &mut tree,
                i,
                j,
                params.support,
                params.purity,
                params.mode,
            );
            if !found.is_empty() {
                results.lock().unwrap().set(i, j, found);
            }
        }
        Ok(())
    })?;

    Ok(results.into_inner().unwrap())
}
