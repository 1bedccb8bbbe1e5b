//! C4 — numeric segment tree: answers "best contiguous leaf range" under
//! `mode ∈ {low variance, high mean, low mean}` (spec §4.3.2), using Chan's
//! parallel variance formulas to combine sums of squared error.

use crate::config::Mode;
use crate::leaf::Leaf;
use crate::tree::{argmax3, argmin3, find_leaf, NodeId, NodeShape};

/// Sentinel standing in for "infinite" band / SSE, matching the original's
/// `1E32` (an ineligible interval, spec §4.3.2: "An interval with `n <= 1`
/// is ineligible").
const INF: f64 = 1e32;

#[derive(Debug, Clone)]
struct NumNode {
    shape: NodeShape,
    total: u32,
    leftn: u32,
    rightn: u32,
    optimaln: u32,
    mean: f64,
    left_mean: f64,
    right_mean: f64,
    optimal_mean: f64,
    total_sum: f64,
    left_sum: f64,
    right_sum: f64,
    optimal_sum: f64,
}

impl NumNode {
    fn new(shape: NodeShape) -> Self {
        Self {
            shape,
            total: 0,
            leftn: 0,
            rightn: 0,
            optimaln: 0,
            mean: 0.0,
            left_mean: 0.0,
            right_mean: 0.0,
            optimal_mean: 0.0,
            total_sum: INF,
            left_sum: INF,
            right_sum: INF,
            optimal_sum: INF,
        }
    }
}

#[derive(Clone, Copy)]
struct Snapshot {
    total: u32,
    leftn: u32,
    rightn: u32,
    optimaln: u32,
    mean: f64,
    left_mean: f64,
    right_mean: f64,
    optimal_mean: f64,
    total_sum: f64,
    left_sum: f64,
    right_sum: f64,
    optimal_sum: f64,
    optimal_start: usize,
    optimal_end: usize,
}

impl From<&NumNode> for Snapshot {
    fn from(n: &NumNode) -> Self {
        Self {
            total: n.total,
            leftn: n.leftn,
            rightn: n.rightn,
            optimaln: n.optimaln,
            mean: n.mean,
            left_mean: n.left_mean,
            right_mean: n.right_mean,
            optimal_mean: n.optimal_mean,
            total_sum: n.total_sum,
            left_sum: n.left_sum,
            right_sum: n.right_sum,
            optimal_sum: n.optimal_sum,
            optimal_start: n.shape.optimal_start,
            optimal_end: n.shape.optimal_end,
        }
    }
}

/// `mean(m1, m2, n1, n2)` from spec §4.3.2, Chan's parallel-mean formula.
fn aggregate_mean(mean1: f64, mean2: f64, n1: u32, n2: u32) -> f64 {
    let delta = mean2 - mean1;
    mean1 + (delta * n2 as f64) / (n1 + n2).max(1) as f64
}

/// `sse(sse1, sse2, m1, m2, n1, n2)` from spec §4.3.2, Chan's parallel
/// sum-of-squared-error formula, short-circuiting when either side is empty.
fn aggregate_sse(sse1: f64, sse2: f64, mean1: f64, mean2: f64, n1: u32, n2: u32) -> f64 {
    if n1 == 0 {
        return sse2;
    }
    if n2 == 0 {
        return sse1;
    }
    let delta = mean2 - mean1;
    sse1 + sse2 + (delta * delta * n1 as f64 * n2 as f64) / (n1 + n2).max(1) as f64
}

/// Width of one standard error: `sqrt(sse / max(n-1,1)) / sqrt(max(n,1))`.
fn confidence_band(sse: f64, n: u32) -> f64 {
    let sdev = (sse / n.saturating_sub(1).max(1) as f64).sqrt();
    sdev / (n.max(1) as f64).sqrt()
}

/// Path choice for mode 0 (low variance): tightest confidence band wins.
fn optimal_path(left: Snapshot, right: Option<Snapshot>) -> usize {
    let left_optimal = if left.total > 1 { left.optimal_sum } else { INF };
    let right_optimal = match right {
        Some(r) if r.total > 1 => r.optimal_sum,
        _ => INF,
    };
    let right_left_sum = right.map_or(INF, |r| r.left_sum);
    let right_leftn = right.map_or(0, |r| r.leftn);
    let right_left_mean = right.map_or(0.0, |r| r.left_mean);

    let straddle_sum = aggregate_sse(left.right_sum, right_left_sum, left.right_mean, right_left_mean, left.rightn, right_leftn);
    let straddle_mean = aggregate_mean(left.right_mean, right_left_mean, left.rightn, right_leftn);

    let left_band = confidence_band(left_optimal, left.optimaln);
    let (right_band, straddle_band) = match right {
        Some(r) => (
            confidence_band(right_optimal, r.optimaln),
            confidence_band(straddle_sum, left.rightn + right_leftn),
        ),
        None => (INF, INF),
    };

    argmin3(left_band, right_band, straddle_band)
}

/// Path choice for modes 1/2 (high/low mean): tightest bound on the mean.
fn optimal_mean_path(left: Snapshot, right: Option<Snapshot>, is_high: bool) -> usize {
    let left_optimal = if left.total > 1 { left.optimal_sum } else { INF };
    let right_optimal = match right {
        Some(r) if r.total > 1 => r.optimal_sum,
        _ => INF,
    };
    let right_left_sum = right.map_or(INF, |r| r.left_sum);
    let right_leftn = right.map_or(0, |r| r.leftn);
    let right_left_mean = right.map_or(0.0, |r| r.left_mean);

    let straddle_sum = aggregate_sse(left.right_sum, right_left_sum, left.right_mean, right_left_mean, left.rightn, right_leftn);
    let straddle_mean = aggregate_mean(left.right_mean, right_left_mean, left.rightn, right_leftn);

    let left_band = confidence_band(left_optimal, left.optimaln);
    let (right_band, straddle_band, right_optimal_mean) = match right {
        Some(r) => (
            confidence_band(right_optimal, r.optimaln),
            confidence_band(straddle_sum, left.rightn + right_leftn),
            r.optimal_mean,
        ),
        None => (INF, INF, 0.0),
    };

    if is_high {
        argmax3(left.optimal_mean - left_band, right_optimal_mean - right_band, straddle_mean - straddle_band)
    } else {
        argmin3(left.optimal_mean + left_band, right_optimal_mean + right_band, straddle_mean + straddle_band)
    }
}

/// Segment tree over the leaves of one column, scored for a numeric output.
/// Reused across A-axis intervals by resetting inner state.
#[derive(Debug, Clone)]
pub struct NumericTree {
    nodes: Vec<NumNode>,
    root: NodeId,
    num_leaves: usize,
    leaf_cutoffs: Vec<f64>,
    mode: Mode,
}

impl NumericTree {
    /// Builds a tree bottom-up from `leaves` (spec §4.3), defaulting to
    /// [`Mode::LowVariance`] until [`Self::set_mode`] is called.
    pub fn build(leaves: &[Leaf]) -> Self {
        assert!(!leaves.is_empty(), "a column must have at least one leaf");
        let mut nodes = Vec::with_capacity(leaves.len() * 2);
        let mut leaf_cutoffs = Vec::with_capacity(leaves.len());
        let mut level = Vec::with_capacity(leaves.len());

        for l in leaves {
            let shape = NodeShape::leaf(l.first, l.last, l.right_cutoff);
            leaf_cutoffs.push(l.right_cutoff);
            nodes.push(NumNode::new(shape));
            level.push(NodeId((nodes.len() - 1) as u32));
        }
        let num_leaves = nodes.len();

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len() / 2 + 1);
            let mut it = level.into_iter();
            while let Some(left) = it.next() {
                let right = it.next();
                let left_shape = nodes[left.idx()].shape;
                let right_shape = right.map(|r| (r, nodes[r.idx()].shape));
                let shape = NodeShape::parent(left, left_shape, right_shape);
                nodes.push(NumNode::new(shape));
                next.push(NodeId((nodes.len() - 1) as u32));
            }
            level = next;
        }

        let root = level[0];
        Self {
            nodes,
            root,
            num_leaves,
            leaf_cutoffs,
            mode: Mode::LowVariance,
        }
    }

    /// Selects the objective used by [`Self::update_tree`].
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Inserts one `(value, score)` observation, updating the target
    /// leaf's running mean and sum-of-squared-error via Welford's formula
    /// (spec §4.3.3).
    pub fn insert(&mut self, value: f64, score: f64) {
        let idx = find_leaf(&self.leaf_cutoffs, value);
        let node = &mut self.nodes[idx];
        if node.total == 0 {
            node.total_sum = 0.0;
        }
        let mean = node.mean + (score - node.mean) / (node.total + 1) as f64;
        let sse = node.total_sum + (score - mean) * (score - node.mean);
        node.total += 1;
        node.mean = mean;
        node.left_mean = mean;
        node.right_mean = mean;
        node.optimal_mean = mean;
        node.total_sum = sse;
        node.left_sum = sse;
        node.right_sum = sse;
        node.optimal_sum = sse;
        node.leftn += 1;
        node.rightn += 1;
        node.optimaln += 1;
    }

    /// Post-order update of every inner node (spec §4.3.2).
    pub fn update_tree(&mut self) {
        for idx in self.num_leaves..self.nodes.len() {
            self.update_node(idx);
        }
    }

    fn update_node(&mut self, idx: usize) {
        let shape = self.nodes[idx].shape;
        let left_id = shape.left.expect("inner node must have a left child");
        let left = Snapshot::from(&self.nodes[left_id.idx()]);
        let right_id = shape.right;
        let right = right_id.map(|r| Snapshot::from(&self.nodes[r.idx()]));

        let left_optimal = if left.total > 1 { left.optimal_sum } else { INF };
        let right_optimal = match right {
            Some(r) if r.total > 1 => r.optimal_sum,
            _ => INF,
        };
        let right_total_sum = right.map_or(INF, |r| r.total_sum);
        let right_left_sum = right.map_or(INF, |r| r.left_sum);
        let right_right_sum = right.map_or(INF, |r| r.right_sum);
        let right_leftn = right.map_or(0, |r| r.leftn);
        let right_left_mean = right.map_or(0.0, |r| r.left_mean);
        let rightt = right.map_or(0, |r| r.total);
        let right_mean = right.map_or(0.0, |r| r.mean);

        let path = match self.mode {
            Mode::LowVariance => optimal_path(left, right),
            Mode::HighMean => optimal_mean_path(left, right, true),
            Mode::LowMean => optimal_mean_path(left, right, false),
        };

        let optimal_start;
        let mut optimal_end = shape.optimal_end;
        let optimal_mean;
        let optimaln;
        let optimal_sum;
        let left_sum;
        let left_mean;
        let leftn;
        let right_sum;
        let right_mean_new;
        let rightn;

        match path {
            0 => {
                optimal_start = left.optimal_start;
                optimal_end = left.optimal_end;
                optimal_mean = left.optimal_mean;
                optimaln = left.optimaln;
                optimal_sum = left_optimal;
                left_sum = left.left_sum;
                left_mean = left.left_mean;
                leftn = left.leftn;
                right_mean_new = aggregate_mean(right_mean, left.right_mean, rightt, left.rightn);
                right_sum = aggregate_sse(right_total_sum, left.right_sum, right_mean, left.right_mean, rightt, left.rightn);
                rightn = rightt + left.rightn;
            }
            1 => {
                let r = right.expect("path 1 requires a right child");
                optimal_start = r.optimal_start;
                optimal_end = r.optimal_end;
                optimal_mean = r.optimal_mean;
                optimaln = r.optimaln;
                optimal_sum = right_optimal;
                left_mean = aggregate_mean(left.mean, right_left_mean, left.total, right_leftn);
                left_sum = aggregate_sse(left.total_sum, right_left_sum, left.mean, right_left_mean, left.total, right_leftn);
                leftn = left.total + right_leftn;
                right_sum = right_right_sum;
                right_mean_new = r.right_mean;
                rightn = r.rightn;
            }
            _ => {
                optimal_start = left.optimal_start;
                if let Some(r) = right {
                    optimal_end = r.optimal_end;
                }
                let straddle_sum = aggregate_sse(left.right_sum, right_left_sum, left.right_mean, right_left_mean, left.rightn, right_leftn);
                let straddle_mean = aggregate_mean(left.right_mean, right_left_mean, left.rightn, right_leftn);
                optimal_mean = straddle_mean;
                optimaln = left.rightn + right_leftn;
                optimal_sum = straddle_sum;

                left_mean = aggregate_mean(left.mean, right_left_mean, left.total, right_leftn);
                left_sum = aggregate_sse(left.total_sum, right_left_sum, left.mean, right_left_mean, left.total, right_leftn);
                leftn = left.total + right_leftn;

                right_mean_new = aggregate_mean(right_mean, left.right_mean, rightt, left.rightn);
                right_sum = aggregate_sse(right_total_sum, left.right_sum, right_mean, left.right_mean, rightt, left.rightn);
                rightn = rightt + left.rightn;
            }
        }

        let total_sum = aggregate_sse(left.total_sum, right_total_sum, left.mean, right_mean, left.total, rightt);
        let mean = aggregate_mean(left.mean, right_mean, left.total, rightt);
        let total = left.total + rightt;

        let node = &mut self.nodes[idx];
        node.shape.optimal_start = optimal_start;
        node.shape.optimal_end = optimal_end;
        node.optimal_mean = optimal_mean;
        node.optimaln = optimaln;
        node.optimal_sum = optimal_sum;
        node.left_sum = left_sum;
        node.left_mean = left_mean;
        node.leftn = leftn;
        node.right_sum = right_sum;
        node.right_mean = right_mean_new;
        node.rightn = rightn;
        node.total_sum = total_sum;
        node.mean = mean;
        node.total = total;

        self.reset_node(left_id.idx(), true);
        if let Some(r) = right_id {
            self.reset_node(r.idx(), true);
        }
    }

    /// Resets one node. Unlike the classification variant, a leaf under
    /// `exclude_leaves = true` is skipped entirely: its running mean/SSE
    /// *is* its accumulated data (there is no separate histogram to
    /// preserve selectively), so touching it would discard inserted rows.
    fn reset_node(&mut self, idx: usize, exclude_leaves: bool) {
        if exclude_leaves && self.nodes[idx].shape.is_leaf() {
            return;
        }
        let node = &mut self.nodes[idx];
        node.total_sum = INF;
        node.left_sum = INF;
        node.right_sum = INF;
        node.optimal_sum = INF;
        node.shape.optimal_start = node.shape.first;
        node.shape.optimal_end = node.shape.last;
        node.mean = 0.0;
        node.left_mean = 0.0;
        node.right_mean = 0.0;
        node.optimal_mean = 0.0;
        node.leftn = 0;
        node.rightn = 0;
        node.total = 0;
        node.optimaln = 0;
    }

    /// Resets every node. `exclude_leaves = true` preserves leaf data.
    pub fn reset(&mut self, exclude_leaves: bool) {
        for idx in 0..self.nodes.len() {
            self.reset_node(idx, exclude_leaves);
        }
    }

    /// Resets just the root, the only node `update_tree` itself leaves
    /// dirty (every other node is reset as its parent folds it in).
    pub fn reset_root(&mut self, exclude_leaves: bool) {
        self.reset_node(self.root.idx(), exclude_leaves);
    }

    /// `(total, mean, sum_sq_error)` for the tree's current objective pass.
    pub fn root_optimal(&self) -> (u32, f64, f64) {
        let root = &self.nodes[self.root.idx()];
        (root.optimaln, root.optimal_mean, root.optimal_sum)
    }

    /// `(optimal_start, optimal_end)` for the tree's current objective pass.
    pub fn root_range(&self) -> (usize, usize) {
        let root = &self.nodes[self.root.idx()];
        (root.shape.optimal_start, root.shape.optimal_end)
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ArrayDataset, Dataset};

    fn brute_force_min_sse(values: &[f64]) -> (f64, usize, usize) {
        let mut best = f64::INFINITY;
        let mut best_range = (0, 0);
        for start in 0..values.len() {
            for end in start..values.len() {
                let n = end - start + 1;
                if n <= 1 {
                    continue;
                }
                let slice = &values[start..=end];
                let m = slice.iter().sum::<f64>() / n as f64;
                let sse: f64 = slice.iter().map(|v| (v - m) * (v - m)).sum();
                if sse < best {
                    best = sse;
                    best_range = (start, end);
                }
            }
        }
        (best, best_range.0, best_range.1)
    }

    #[test]
    fn low_variance_matches_brute_force() {
        let values = vec![5.0, 5.1, 4.9, 10.0, 0.0, 20.0, 5.05, 4.95, 5.02];
        let ds = ArrayDataset::numeric((0..values.len()).map(|i| i as f64).collect(), 1, values.clone());
        let rows: Vec<u32> = (0..ds.rows() as u32).collect();
        let sorted = crate::sorted_index::build(&ds, &rows, 0);
        let leaves = crate::leaf::build_leaves(&ds, &sorted, 0, 1);
        let mut tree = NumericTree::build(&leaves);
        tree.set_mode(Mode::LowVariance);

        for &row in sorted.iter() {
            let value = ds.feature(row as usize, 0);
            let score = ds.output(row as usize);
            tree.insert(value, score);
        }
        tree.update_tree();

        let (total, _mean, sse) = tree.root_optimal();
        let (expected_sse, bf_start, bf_end) = brute_force_min_sse(&values);
        assert!(total >= 2);
        assert!((sse - expected_sse).abs() / expected_sse.max(1.0) < 1e-6, "{sse} vs {expected_sse}");
        let _ = (bf_start, bf_end);
    }
}
