//! C6 — pair evaluator: slides a classification or numeric segment tree
//! for column `j` across every `(m, n)` row-interval of column `i`,
//! keeping the strongest non-overlapping box per region (spec §4.4–§4.5).

use crate::config::Mode;
use crate::dataset::Dataset;
use crate::interval::Interval;
use crate::projection::{Payload, ProjectionBox};
use crate::tree::classification::ClassificationTree;
use crate::tree::numeric::NumericTree;

/// Inserts `qr` into `pr_array`, keeping only the better of any pair of
/// overlapping boxes (spec §4.5: "first-overlap-wins dedup").
fn insert_if_better(pr_array: &mut Vec<ProjectionBox>, qr: ProjectionBox) {
    for existing in pr_array.iter_mut() {
        if qr.overlaps(existing) {
            if qr.beats(existing) {
                *existing = qr;
            }
            return;
        }
    }
    pr_array.push(qr);
}

/// Evaluates column pair `(i, j)` against a classification output,
/// scoring every non-excluded class at every qualifying row interval.
///
/// `sorted_i` is column `i`'s full sorted-row permutation; `sorted_j` is
/// the same for column `j`, which `tree` was built over. `tree` is
/// reused and must be freshly built (histograms empty) on entry.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_pair_classification(
    dataset: &dyn Dataset,
    sorted_i: &[u32],
    sorted_j: &[u32],
    intervals: &[Interval],
    tree: &mut ClassificationTree,
    i: usize,
    j: usize,
    support: usize,
    purity_threshold: f64,
    num_classes: usize,
    exclude_class: Option<u32>,
) -> Vec<ProjectionBox> {
    let mut pr_array: Vec<ProjectionBox> = Vec::with_capacity(10);
    let mut orig_m: Option<usize> = None;
    let mut k = 0usize;
    let mut seen_any = false;

    for interval in intervals {
        let m = interval.m;
        let n = interval.n;

        if orig_m != Some(m) {
            orig_m = Some(m);
            if seen_any {
                k = 0;
                tree.reset(false);
            }
        }
        seen_any = true;

        let size = n - m + 1;
        if size < support {
            continue;
        }

        while k < size {
            let row = sorted_i[k + m];
            let value = dataset.feature(row as usize, j);
            let class = dataset.output(row as usize) as usize;
            tree.insert(value, class);
            k += 1;
        }

        for l in 0..num_classes {
            if exclude_class == Some(l as u32) {
                continue;
            }

            tree.set_leaves_for_class(l);
            tree.update_tree();

            let (start, end, pos, neg) = tree.root_optimal();
            let purity = if pos + neg > 0 { pos as f64 / (pos + neg) as f64 } else { 0.0 };
            let match_box = (pos + neg) as usize >= support && purity >= purity_threshold;

            if match_box {
                let att1_range = (
                    dataset.feature(sorted_i[m] as usize, i),
                    dataset.feature(sorted_i[n] as usize, i),
                );
                let att2_range = (
                    dataset.feature(sorted_j[start] as usize, j),
                    dataset.feature(sorted_j[end] as usize, j),
                );
                let qr = ProjectionBox::new(
                    i,
                    j,
                    att1_range,
                    att2_range,
                    Payload::Classification { class_label: l as u32, pos, neg },
                );
                insert_if_better(&mut pr_array, qr);
            }

            tree.reset_root(true);
        }
    }

    tree.reset(false);
    pr_array
}

/// Evaluates column pair `(i, j)` against a numeric output, under
/// `mode`'s objective.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_pair_numeric(
    dataset: &dyn Dataset,
    sorted_i: &[u32],
    sorted_j: &[u32],
    intervals: &[Interval],
    tree: &mut NumericTree,
    i: usize,
    j: usize,
    support: usize,
    purity_threshold: f64,
    mode: Mode,
) -> Vec<ProjectionBox> {
    let mut pr_array: Vec<ProjectionBox> = Vec::with_capacity(10);
    let mut orig_m: Option<usize> = None;
    let mut k = 0usize;
    let mut seen_any = false;

    for interval in intervals {
        let m = interval.m;
        let n = interval.n;

        if orig_m != Some(m) {
            orig_m = Some(m);
            if seen_any {
                k = 0;
                tree.reset(false);
            }
        }
        seen_any = true;

        let size = n - m + 1;
        if size < support {
            continue;
        }

        while k < size {
            let row = sorted_i[k + m];
            let value = dataset.feature(row as usize, j);
            let score = dataset.output(row as usize);
            tree.insert(value, score);
            k += 1;
        }

        tree.update_tree();

        let (total, mean, sum_sq_error) = tree.root_optimal();
        let match_box = total as usize >= support;
        let mean_proper = match mode {
            Mode::LowVariance => true,
            Mode::HighMean => mean > purity_threshold,
            Mode::LowMean => mean < purity_threshold,
        };

        if match_box && mean_proper {
            let (start, end) = tree.root_range();
            let att1_range = (
                dataset.feature(sorted_i[m] as usize, i),
                dataset.feature(sorted_i[n] as usize, i),
            );
            let att2_range = (
                dataset.feature(sorted_j[start] as usize, j),
                dataset.feature(sorted_j[end] as usize, j),
            );
            let qr = ProjectionBox::new(i, j, att1_range, att2_range, Payload::Numeric { total, mean, sum_sq_error });
            insert_if_better(&mut pr_array, qr);
        }

        tree.reset_root(true);
    }

    tree.reset(false);
    pr_array
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrayDataset;
    use crate::leaf;
    use crate::sorted_index;

    #[test]
    fn classification_finds_the_planted_box() {
        // Column 0 drives row order; the positive class lives in rows
        // where column 1's value is also small.
        let n = 40;
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for r in 0..n {
            let x = r as f64;
            let y = (r % 7) as f64;
            features.push(x);
            features.push(y);
            labels.push(if y < 2.0 { 1u32 } else { 0u32 });
        }
        let ds = ArrayDataset::classification(features, 2, labels, 2);
        let rows: Vec<u32> = (0..n as u32).collect();
        let sorted = sorted_index::build_all(&ds, &rows);

        let leaves_1 = leaf::build_leaves(&ds, &sorted[1], 1, 2);
        let mut tree = ClassificationTree::build(&leaves_1, 2);
        let intervals = crate::interval::build(&ds, &sorted[0], 0, 4);

        let found = evaluate_pair_classification(&ds, &sorted[0], &sorted[1], &intervals, &mut tree, 0, 1, 4, 0.5, 2, None);
        assert!(!found.is_empty(), "a pure low-y region should be found");
        assert!(found.iter().any(|pr| matches!(pr.payload, Payload::Classification { class_label: 1, .. })));
    }

    #[test]
    fn numeric_respects_support_threshold() {
        let n = 30;
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for r in 0..n {
            features.push(r as f64);
            features.push((r % 5) as f64);
            targets.push(if r % 5 == 0 { 100.0 } else { 1.0 });
        }
        let ds = ArrayDataset::numeric(features, 2, targets);
        let rows: Vec<u32> = (0..n as u32).collect();
        let sorted = sorted_index::build_all(&ds, &rows);
        let leaves_1 = leaf::build_leaves(&ds, &sorted[1], 1, 2);
        let mut tree = NumericTree::build(&leaves_1);
        tree.set_mode(Mode::HighMean);
        let intervals = crate::interval::build(&ds, &sorted[0], 0, 4);

        let found = evaluate_pair_numeric(&ds, &sorted[0], &sorted[1], &intervals, &mut tree, 0, 1, 1000, 0.0, Mode::HighMean);
        assert!(found.is_empty(), "support above dataset size must yield nothing");
    }
}
