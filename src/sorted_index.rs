//! C1 — sorted-index table: a per-column permutation of row ids, ascending
//! by that column's feature value.

use crate::dataset::Dataset;
use ordered_float::OrderedFloat;

/// A permutation of `rows` (a subset of dataset row ids) such that
/// `feature(ids[k], col)` is non-decreasing in `k`.
///
/// Ties are broken by original row id so the permutation is deterministic
/// across runs, as spec §4.1 requires.
pub fn build(dataset: &dyn Dataset, rows: &[u32], col: usize) -> Vec<u32> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|&row| (OrderedFloat(dataset.feature(row as usize, col)), row));
    sorted
}

/// Builds the sorted-index table for every column of `dataset`, restricted
/// to `rows`. Index `i` of the returned vector is the sorted permutation
/// for column `i`.
pub fn build_all(dataset: &dyn Dataset, rows: &[u32]) -> Vec<Vec<u32>> {
    (0..dataset.cols()).map(|col| build(dataset, rows, col)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrayDataset;

    #[test]
    fn sorts_ascending_and_is_deterministic() {
        let ds = ArrayDataset::numeric(vec![3.0, 1.0, 2.0, 2.0], 1, vec![0.0; 4]);
        let rows: Vec<u32> = (0..ds.rows() as u32).collect();
        let sorted = build(&ds, &rows, 0);
        let values: Vec<f64> = sorted.iter().map(|&r| ds.feature(r as usize, 0)).collect();
        assert_eq!(values, vec![1.0, 2.0, 2.0, 3.0]);
        // ties (rows 2 and 3, both value 2.0) break by row id
        assert_eq!(sorted, vec![1, 2, 3, 0]);

        let sorted_again = build(&ds, &rows, 0);
        assert_eq!(sorted, sorted_again);
    }
}
