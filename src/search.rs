//! Public entry points wiring the search engine components together
//! (spec §6): `search_projections`, `find_easy_explain_data`, and
//! `find_class_nuggets`.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use crate::config::{DecisionListParams, SearchParams};
use crate::dataset::Dataset;
use crate::decision_list::{self, DecisionListOutcome};
use crate::dispatch;
use crate::error::{Error, Result};
use crate::feature_map::{FeatureMap, ProjectionList};
use crate::sorted_index;

/// Summary of one `search_projections` run, logged at `info` level in
/// place of the original's `printf`/`clock()` progress line.
#[derive(Debug, Clone, Copy)]
pub struct SearchStats {
    pub pairs_evaluated: usize,
    pub boxes_found: usize,
    pub elapsed: Duration,
}

/// [`FeatureMap`] plus this run's [`SearchStats`].
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub feature_map: FeatureMap,
    pub stats: SearchStats,
}

/// Exhaustively searches every ordered column pair for statistically
/// interesting projection boxes (spec §6).
pub fn search_projections(dataset: &dyn Dataset, params: SearchParams) -> Result<SearchOutcome> {
    params.validate(dataset)?;
    let start = Instant::now();

    let rows: Vec<u32> = (0..dataset.rows() as u32).collect();
    let sorted = sorted_index::build_all(dataset, &rows);
    let abort = AtomicBool::new(false);

    let feature_map = if dataset.is_classification() {
        dispatch::run_classification(dataset, &sorted, params, dataset.num_classes(), None, &abort)?
    } else {
        dispatch::run_numeric(dataset, &sorted, params, &abort)?
    };

    let cols = dataset.cols();
    let stats = SearchStats {
        pairs_evaluated: cols.saturating_sub(1) * cols / 2,
        boxes_found: feature_map.num_projections(),
        elapsed: start.elapsed(),
    };
    log::info!(
        "search_projections: {} pairs evaluated, {} boxes found in {:?}",
        stats.pairs_evaluated,
        stats.boxes_found,
        stats.elapsed
    );

    Ok(SearchOutcome { feature_map, stats })
}

/// Greedy decision list of disjoint boxes covering as much of the
/// training data as possible, validated against a held-out split
/// (spec §6).
pub fn find_easy_explain_data(dataset: &dyn Dataset, params: DecisionListParams) -> Result<DecisionListOutcome> {
    decision_list::find_easy_explain_data(dataset, params)
}

/// Classification-only greedy "class nuggets" decision list (spec §6):
/// like [`find_easy_explain_data`] but with no validation split, picking
/// the single largest-support box each round.
pub fn find_class_nuggets(dataset: &dyn Dataset, params: SearchParams) -> Result<ProjectionList> {
    params.validate(dataset)?;
    if !dataset.is_classification() {
        return Err(Error::ModeMismatch("find_class_nuggets requires a classification dataset"));
    }
    decision_list::find_class_nuggets(dataset, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::dataset::ArrayDataset;

    #[test]
    fn find_class_nuggets_rejects_numeric_dataset() {
        let ds = ArrayDataset::numeric(vec![0.0, 1.0, 2.0, 3.0], 1, vec![0.0, 1.0, 2.0, 3.0]);
        let params = SearchParams {
            bin_size: 1,
            support: 1,
            purity: 0.5,
            mode: Mode::LowVariance,
            num_threads: 1,
        };
        let err = find_class_nuggets(&ds, params).unwrap_err();
        assert!(matches!(err, Error::ModeMismatch(_)));
    }

    #[test]
    fn search_projections_rejects_zero_bin_size() {
        let ds = ArrayDataset::numeric(vec![0.0, 1.0, 2.0], 1, vec![0.0, 1.0, 2.0]);
        let params = SearchParams {
            bin_size: 0,
            support: 1,
            purity: 0.5,
            mode: Mode::LowVariance,
            num_threads: 1,
        };
        let err = search_projections(&ds, params).unwrap_err();
        assert!(matches!(err, Error::InvalidBinSize { .. }));
    }
}
