//! C9 — projection boxes: the axis-aligned rectangle over two columns that
//! a search round reports, together with the overlap and betterness rules
//! used to keep only the strongest non-overlapping box per region (spec
//! §4.5, §4.6).

use std::cell::OnceCell;
use std::cmp::Ordering;

use itertools::{EitherOrBoth, Itertools};

use crate::dataset::Dataset;

/// The statistics a box carries, depending on the dataset's output kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `class_label` is the positive class this box was scored against;
    /// `pos`/`neg` count rows of that class vs. all others inside the box.
    Classification { class_label: u32, pos: u32, neg: u32 },
    /// `total` rows inside the box, with running `mean` and `sum_sq_error`
    /// of the output column.
    Numeric { total: u32, mean: f64, sum_sq_error: f64 },
}

impl Payload {
    pub fn total(&self) -> u32 {
        match self {
            Payload::Classification { pos, neg, .. } => pos + neg,
            Payload::Numeric { total, .. } => *total,
        }
    }

    /// `pos / (pos + neg)` for classification boxes, `None` for numeric.
    pub fn purity(&self) -> Option<f64> {
        match self {
            Payload::Classification { pos, neg, .. } => Some(*pos as f64 / (pos + neg) as f64),
            Payload::Numeric { .. } => None,
        }
    }
}

/// A rectangle `att1_range × att2_range` over columns `att1` and `att2`,
/// plus the statistics that made it interesting.
///
/// Row membership (`indices`) is expensive (two binary searches plus a
/// set intersection) and most boxes are discarded as non-winners before
/// anyone asks for it, so it is computed once, lazily, and cached.
#[derive(Debug, Clone)]
pub struct ProjectionBox {
    pub att1: usize,
    pub att2: usize,
    pub att1_range: (f64, f64),
    pub att2_range: (f64, f64),
    pub payload: Payload,
    indices: OnceCell<Vec<u32>>,
}

impl ProjectionBox {
    pub fn new(att1: usize, att2: usize, att1_range: (f64, f64), att2_range: (f64, f64), payload: Payload) -> Self {
        Self {
            att1,
            att2,
            att1_range,
            att2_range,
            payload,
            indices: OnceCell::new(),
        }
    }

    /// Whether `row` falls inside both axis ranges.
    pub fn contains(&self, dataset: &dyn Dataset, row: usize) -> bool {
        let v1 = dataset.feature(row, self.att1);
        let v2 = dataset.feature(row, self.att2);
        v1 >= self.att1_range.0 && v1 <= self.att1_range.1 && v2 >= self.att2_range.0 && v2 <= self.att2_range.1
    }

    /// True when both boxes project the same column pair (and, for
    /// classification, the same class label) and their rectangles
    /// intersect.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.att1 != other.att1 || self.att2 != other.att2 {
            return false;
        }
        if let (Payload::Classification { class_label: a, .. }, Payload::Classification { class_label: b, .. }) =
            (&self.payload, &other.payload)
        {
            if a != b {
                return false;
            }
        }
        lines_overlap(self.att1_range, other.att1_range) && lines_overlap(self.att2_range, other.att2_range)
    }

    /// True if `self` is the statistically stronger box: higher purity
    /// (ties broken by support) for classification, lower sum-of-squared
    /// error (ties broken by support) for numeric.
    pub fn beats(&self, other: &Self) -> bool {
        match (&self.payload, &other.payload) {
            (Payload::Classification { .. }, Payload::Classification { .. }) => {
                let purity1 = self.payload.purity().unwrap();
                let purity2 = other.payload.purity().unwrap();
                match purity1.partial_cmp(&purity2) {
                    Some(Ordering::Equal) | None => self.payload.total() > other.payload.total(),
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Less) => false,
                }
            }
            (Payload::Numeric { sum_sq_error: s1, .. }, Payload::Numeric { sum_sq_error: s2, .. }) => {
                match s1.partial_cmp(s2) {
                    Some(Ordering::Equal) | None => self.payload.total() > other.payload.total(),
                    Some(Ordering::Less) => true,
                    Some(Ordering::Greater) => false,
                }
            }
            _ => false,
        }
    }

    /// Evaluates this box against an arbitrary row subset (typically a
    /// validation split): classification returns the purity of the box's
    /// declared class within `rows`, numeric returns the mean output.
    /// The second element is the support actually observed (rows of
    /// `rows` landing inside the box); an empty intersection yields NaN,
    /// matching the unguarded division of the search this is ported from.
    pub fn score_on(&self, dataset: &dyn Dataset, rows: &[u32]) -> (f64, usize) {
        let mut count = 0usize;
        match &self.payload {
            Payload::Classification { class_label, .. } => {
                let mut class_count = 0usize;
                for &row in rows {
                    if self.contains(dataset, row as usize) {
                        count += 1;
                        if dataset.output(row as usize) as u32 == *class_label {
                            class_count += 1;
                        }
                    }
                }
                (class_count as f64 / count as f64, count)
            }
            Payload::Numeric { .. } => {
                let mut sum = 0.0;
                for &row in rows {
                    if self.contains(dataset, row as usize) {
                        count += 1;
                        sum += dataset.output(row as usize);
                    }
                }
                (sum / count as f64, count)
            }
        }
    }

    /// Row ids inside this box, intersected against `sorted` (one
    /// ascending-by-value row permutation per column). Computed once and
    /// cached (spec §4.6: "late-bound, memoized").
    pub fn indices(&self, sorted: &[Vec<u32>], dataset: &dyn Dataset) -> &[u32] {
        self.indices.get_or_init(|| {
            let iv1 = &sorted[self.att1];
            let iv2 = &sorted[self.att2];

            let start1 = find_index(iv1, dataset, self.att1_range.0, self.att1, true);
            let end1 = find_index(iv1, dataset, self.att1_range.1, self.att1, false);
            let start2 = find_index(iv2, dataset, self.att2_range.0, self.att2, true);
            let end2 = find_index(iv2, dataset, self.att2_range.1, self.att2, false);

            let mut set1 = iv1[start1..=end1].to_vec();
            let mut set2 = iv2[start2..=end2].to_vec();
            set1.sort_unstable();
            set2.sort_unstable();

            merge_intersect(&set1, &set2)
        })
    }
}

fn lines_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    !(b.0 > a.1 || b.1 < a.0)
}

/// Sorted-set intersection (spec §4.8's `Helper::intersection`), via
/// itertools' merge-join over two already-sorted slices.
fn merge_intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    a.iter()
        .merge_join_by(b.iter(), |x, y| x.cmp(y))
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(&x, _) => Some(x),
            _ => None,
        })
        .collect()
}

/// Binary search for the index into `sorted` whose feature value equals
/// (or straddles) `value`: the earliest matching position for `lower`,
/// the latest for `!lower`. Falls back to the nearest insertion point if
/// `value` is not an exact match (spec §4.6, `find_index`).
fn find_index(sorted: &[u32], dataset: &dyn Dataset, value: f64, col: usize, lower: bool) -> usize {
    let n = sorted.len();
    let mut lb: isize = 0;
    let mut ub: isize = n as isize - 1;

    while lb < ub {
        let m = ((lb + ub) / 2) as usize;
        let mval = dataset.feature(sorted[m] as usize, col);

        if mval == value {
            if !lower {
                if m + 1 > n - 1 {
                    return m;
                }
                if dataset.feature(sorted[m + 1] as usize, col) > value {
                    return m;
                }
                lb = m as isize + 1;
            } else {
                if m == 0 {
                    return m;
                }
                if dataset.feature(sorted[m - 1] as usize, col) < value {
                    return m;
                }
                ub = m as isize - 1;
            }
            continue;
        }

        if mval > value {
            ub = m as isize - 1;
        } else {
            lb = m as isize + 1;
        }
    }

    if lb > ub {
        lb = ub;
    }
    if lb < 0 {
        lb = 0;
    }
    lb as usize
}
