//! C5 — row-interval enumeration: the `(m, n)` pairs of sorted-row
//! positions that anchor a sliding scan over column `i` (spec §4.4,
//! "outer" loop of the pair scan).

use crate::dataset::Dataset;
use crate::leaf::TIE_EPSILON;

/// One candidate row-range `[m, n]` into a column's sorted-index
/// permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub m: usize,
    pub n: usize,
}

/// Builds the ordered list of `(m, n)` row-interval anchors for column
/// `col`, stepping `m` and `n` forward in strides of `bin_size` and
/// nudging both endpoints past runs of near-duplicate values so a
/// candidate interval never starts or ends mid-tie.
pub fn build(dataset: &dyn Dataset, sorted: &[u32], col: usize, bin_size: usize) -> Vec<Interval> {
    let rows = sorted.len();
    if rows == 0 {
        return Vec::new();
    }
    let size = rows / bin_size.max(1);
    let mut out = Vec::with_capacity(size * size);

    let value_at = |pos: usize| dataset.feature(sorted[pos] as usize, col);

    let mut m = 0usize;
    while m < rows {
        let mut start_value = value_at(m);
        if m > 0 {
            let last_bin_value = value_at(m - 1);
            while m > 0 && m < rows - 1 {
                if start_value - last_bin_value < TIE_EPSILON {
                    m += 1;
                    start_value = value_at(m);
                } else {
                    break;
                }
            }
        }

        let mut n = m + bin_size;
        while n < rows {
            let n_clamped = n.min(rows - 1);
            let end_value = value_at(n_clamped);
            if end_value - start_value < TIE_EPSILON {
                n += bin_size;
                continue;
            }

            n = n_clamped;
            while n + 1 < rows {
                let value = value_at(n + 1);
                if value - end_value < TIE_EPSILON {
                    n += 1;
                } else {
                    break;
                }
            }

            out.push(Interval { m, n });
            n += bin_size;
        }
        m += bin_size;
    }

    out
}
