//! C2 — leaf factory: splits a sorted column into contiguous leaf bins of
//! target size `bin_size`, extending a bin across near-duplicate values so
//! ties never straddle a leaf boundary.

use crate::dataset::Dataset;

/// Values within this distance are treated as the same tie-bucket (spec §3).
pub const TIE_EPSILON: f64 = 1e-6;

/// A contiguous range `[first, last]` of positions into a [`crate::sorted_index`]
/// permutation. `right_cutoff` is the column value at position `last`,
/// inherited upward by inner tree nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    pub first: usize,
    pub last: usize,
    pub right_cutoff: f64,
}

/// Builds the ordered list of leaves partitioning `sorted` for column `col`.
///
/// `bin_size` is the desired leaf size; actual leaf size is `>= bin_size`
/// because a leaf absorbs any immediately-following rows within
/// [`TIE_EPSILON`] of its boundary value. Degenerate columns (all values
/// identical, or fewer rows than `bin_size`) yield a single leaf spanning
/// the whole column — this is expected, not an error (spec §7).
pub fn build_leaves(dataset: &dyn Dataset, sorted: &[u32], col: usize, bin_size: usize) -> Vec<Leaf> {
    debug_assert!(bin_size >= 1);
    let n = sorted.len();
    let mut leaves = Vec::with_capacity(n / bin_size.max(1) + 1);
    let mut i = 0;
    while i < n {
        let mut binend = (i + bin_size - 1).min(n - 1);
        let mut end_value = dataset.feature(sorted[binend] as usize, col);

        let mut k = binend + 1;
        while k < n {
            let value = dataset.feature(sorted[k] as usize, col);
            if value - end_value < TIE_EPSILON {
                end_value = value;
                binend = k;
                k += 1;
            } else {
                break;
            }
        }

        leaves.push(Leaf {
            first: i,
            last: binend,
            right_cutoff: end_value,
        });
        i = binend + 1;
    }
    leaves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrayDataset;

    fn cols_from(values: &[f64]) -> (ArrayDataset, Vec<u32>) {
        let ds = ArrayDataset::numeric(values.to_vec(), 1, vec![0.0; values.len()]);
        let rows: Vec<u32> = (0..values.len() as u32).collect();
        (ds, rows)
    }

    #[test]
    fn partitions_cover_exactly_and_are_disjoint() {
        let (ds, rows) = cols_from(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let sorted = crate::sorted_index::build(&ds, &rows, 0);
        let leaves = build_leaves(&ds, &sorted, 0, 3);

        assert_eq!(leaves.first().unwrap().first, 0);
        assert_eq!(leaves.last().unwrap().last, sorted.len() - 1);
        for pair in leaves.windows(2) {
            assert_eq!(pair[0].last + 1, pair[1].first, "leaves must be contiguous");
        }
    }

    #[test]
    fn ties_stay_in_one_leaf() {
        // bin_size=2 would normally split after position 1, but values at
        // positions 1 and 2 are equal, so they must share a leaf.
        let (ds, rows) = cols_from(&[0.0, 1.0, 1.0, 1.0, 5.0, 6.0]);
        let sorted = crate::sorted_index::build(&ds, &rows, 0);
        let leaves = build_leaves(&ds, &sorted, 0, 2);

        let leaf_containing_ones = leaves
            .iter()
            .find(|l| l.first <= 1 && l.last >= 3)
            .expect("the three 1.0 values must be in a single leaf");
        assert!(leaf_containing_ones.first <= 1);
        assert!(leaf_containing_ones.last >= 3);
    }

    #[test]
    fn degenerate_column_yields_single_leaf() {
        let (ds, rows) = cols_from(&[5.0, 5.0, 5.0, 5.0]);
        let sorted = crate::sorted_index::build(&ds, &rows, 0);
        let leaves = build_leaves(&ds, &sorted, 0, 2);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].first, 0);
        assert_eq!(leaves[0].last, 3);
    }
}
