//! C3 — classification segment tree: answers "best contiguous leaf range
//! with max (pos - neg)" for a chosen positive class (spec §4.3.1).

use crate::leaf::Leaf;
use crate::tree::{argmax3, find_leaf, NodeId, NodeShape};

/// One node of a classification tree. Leaves carry a non-empty `hist`
/// (class histogram); inner nodes carry an empty one.
#[derive(Debug, Clone)]
struct ClassNode {
    shape: NodeShape,
    total_pos: u32,
    total_neg: u32,
    opt_pos: u32,
    opt_neg: u32,
    left_pos: u32,
    left_neg: u32,
    right_pos: u32,
    right_neg: u32,
    total_sum: f64,
    left_sum: f64,
    right_sum: f64,
    optimal_sum: f64,
    hist: Vec<u32>,
}

impl ClassNode {
    fn leaf(shape: NodeShape, num_classes: usize) -> Self {
        Self {
            shape,
            total_pos: 0,
            total_neg: 0,
            opt_pos: 0,
            opt_neg: 0,
            left_pos: 0,
            left_neg: 0,
            right_pos: 0,
            right_neg: 0,
            total_sum: 0.0,
            left_sum: 0.0,
            right_sum: 0.0,
            optimal_sum: 0.0,
            hist: vec![0; num_classes],
        }
    }

    fn inner(shape: NodeShape) -> Self {
        Self {
            shape,
            total_pos: 0,
            total_neg: 0,
            opt_pos: 0,
            opt_neg: 0,
            left_pos: 0,
            left_neg: 0,
            right_pos: 0,
            right_neg: 0,
            total_sum: 0.0,
            left_sum: 0.0,
            right_sum: 0.0,
            optimal_sum: 0.0,
            hist: Vec::new(),
        }
    }

    fn total(&self) -> u32 {
        self.total_pos + self.total_neg
    }
}

/// Snapshot of the scalar fields needed to update a parent from a child,
/// copied out so the update can hold a mutable borrow of the arena while
/// still reading sibling data (spec §4.3.1's `left_child`/`right_child`).
#[derive(Clone, Copy)]
struct Snapshot {
    optimal_sum: f64,
    total_sum: f64,
    left_sum: f64,
    right_sum: f64,
    opt_pos: u32,
    opt_neg: u32,
    left_pos: u32,
    left_neg: u32,
    right_pos: u32,
    right_neg: u32,
    total_pos: u32,
    total_neg: u32,
    optimal_start: usize,
    optimal_end: usize,
    total: u32,
}

impl From<&ClassNode> for Snapshot {
    fn from(n: &ClassNode) -> Self {
        Self {
            optimal_sum: n.optimal_sum,
            total_sum: n.total_sum,
            left_sum: n.left_sum,
            right_sum: n.right_sum,
            opt_pos: n.opt_pos,
            opt_neg: n.opt_neg,
            left_pos: n.left_pos,
            left_neg: n.left_neg,
            right_pos: n.right_pos,
            right_neg: n.right_neg,
            total_pos: n.total_pos,
            total_neg: n.total_neg,
            optimal_start: n.shape.optimal_start,
            optimal_end: n.shape.optimal_end,
            total: n.total(),
        }
    }
}

/// Segment tree over the leaves of one column, scored for a classification
/// output. Reused across classes and across A-axis intervals by resetting
/// inner state, per spec §3 "Lifecycles".
#[derive(Debug, Clone)]
pub struct ClassificationTree {
    nodes: Vec<ClassNode>,
    root: NodeId,
    num_leaves: usize,
    leaf_cutoffs: Vec<f64>,
}

impl ClassificationTree {
    /// Builds a tree bottom-up from `leaves`, pairing adjacent nodes level
    /// by level (spec §4.3). `num_classes` sizes each leaf's histogram.
    pub fn build(leaves: &[Leaf], num_classes: usize) -> Self {
        assert!(!leaves.is_empty(), "a column must have at least one leaf");
        let mut nodes = Vec::with_capacity(leaves.len() * 2);
        let mut leaf_cutoffs = Vec::with_capacity(leaves.len());
        let mut level = Vec::with_capacity(leaves.len());

        for l in leaves {
            let shape = NodeShape::leaf(l.first, l.last, l.right_cutoff);
            leaf_cutoffs.push(l.right_cutoff);
            nodes.push(ClassNode::leaf(shape, num_classes));
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
                nodes.push(ClassNode::inner(shape));
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
        }
    }

    /// Inserts one `(value, class)` observation into the leaf whose range
    /// contains `value` (spec §4.3.3).
    pub fn insert(&mut self, value: f64, class: usize) {
        let idx = find_leaf(&self.leaf_cutoffs, value);
        self.nodes[idx].hist[class] += 1;
    }

    /// Recomputes every leaf's working totals for `class_label` as the
    /// positive class (spec §4.3.4): `pos = hist[class_label]`,
    /// `neg = sum(hist) - pos`, every sum field set to `pos - neg`.
    pub fn set_leaves_for_class(&mut self, class_label: usize) {
        for i in 0..self.num_leaves {
            let node = &mut self.nodes[i];
            let pos = node.hist[class_label];
            let neg: u32 = node.hist.iter().sum::<u32>() - pos;
            let net = pos as f64 - neg as f64;
            node.total_sum = net;
            node.optimal_sum = net;
            node.left_sum = net;
            node.right_sum = net;
            node.total_pos = pos;
            node.right_pos = pos;
            node.left_pos = pos;
            node.opt_pos = pos;
            node.total_neg = neg;
            node.right_neg = neg;
            node.left_neg = neg;
            node.opt_neg = neg;
        }
    }

    /// Post-order update of every inner node (spec §4.3.1). Because the
    /// arena is built bottom-up one level at a time, a forward scan over
    /// inner-node ids already visits every node after its children.
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

        // valid_to_update: skip entirely empty subtrees.
        if left.total == 0 && right.map_or(true, |r| r.total == 0) {
            return;
        }

        let right_optimal = right.map_or(0.0, |r| r.optimal_sum);
        let right_left_sum = right.map_or(0.0, |r| r.left_sum);
        let right_right_sum = right.map_or(0.0, |r| r.right_sum);
        let right_total_sum = right.map_or(0.0, |r| r.total_sum);

        let path = argmax3(left.optimal_sum, right_optimal, left.right_sum + right_left_sum);

        let (optimal_sum, optimal_start, optimal_end, opt_pos, opt_neg, mut left_pos, mut left_neg, mut right_pos, mut right_neg);
        match path {
            0 => {
                // Left entirely.
                optimal_sum = left.optimal_sum;
                optimal_start = left.optimal_start;
                optimal_end = left.optimal_end;
                opt_pos = left.opt_pos;
                opt_neg = left.opt_neg;
                left_pos = left.left_pos;
                left_neg = left.left_neg;
                right_pos = left.right_pos;
                right_neg = left.right_neg;
                if let Some(r) = right {
                    right_pos += r.total_pos;
                    right_neg += r.total_neg;
                }
            }
            1 => {
                // Right entirely.
                let r = right.expect("path 1 requires a right child");
                optimal_sum = right_optimal;
                left_pos = left.total_pos;
                left_neg = left.total_neg;
                optimal_start = r.optimal_start;
                optimal_end = r.optimal_end;
                opt_pos = r.opt_pos;
                opt_neg = r.opt_neg;
                left_pos += r.left_pos;
                left_neg += r.left_neg;
                right_pos = r.right_pos;
                right_neg = r.right_neg;
            }
            _ => {
                // Straddle: left's best suffix + right's best prefix.
                optimal_sum = left.right_sum + right_left_sum;
                optimal_start = left.optimal_start;
                opt_pos = left.right_pos;
                opt_neg = left.right_neg;
                left_pos = left.total_pos;
                left_neg = left.total_neg;
                right_pos = left.right_pos;
                right_neg = left.right_neg;
                if let Some(r) = right {
                    optimal_end = r.optimal_end;
                    opt_pos += r.left_pos;
                    opt_neg += r.left_neg;
                    left_pos += r.left_pos;
                    left_neg += r.left_neg;
                    right_pos += r.total_pos;
                    right_neg += r.total_neg;
                } else {
                    optimal_end = left.optimal_end;
                }
            }
        }

        let new_left_sum = if left.left_sum >= left.total_sum + right_left_sum {
            left.left_sum
        } else {
            left.total_sum + right_left_sum
        };
        let new_right_sum = if right_right_sum >= right_total_sum + left.right_sum {
            right_right_sum
        } else {
            right_total_sum + left.right_sum
        };
        let new_total_sum = left.total_sum + right_total_sum;
        let mut total_pos = left.total_pos;
        let mut total_neg = left.total_neg;
        if let Some(r) = right {
            total_pos += r.total_pos;
            total_neg += r.total_neg;
        }

        let node = &mut self.nodes[idx];
        node.optimal_sum = optimal_sum;
        node.shape.optimal_start = optimal_start;
        node.shape.optimal_end = optimal_end;
        node.opt_pos = opt_pos;
        node.opt_neg = opt_neg;
        node.left_sum = new_left_sum;
        node.right_sum = new_right_sum;
        node.total_sum = new_total_sum;
        node.left_pos = left_pos;
        node.left_neg = left_neg;
        node.right_pos = right_pos;
        node.right_neg = right_neg;
        node.total_pos = total_pos;
        node.total_neg = total_neg;

        self.reset_node(left_id.idx(), true);
        if let Some(r) = right_id {
            self.reset_node(r.idx(), true);
        }
    }

    /// Resets one node's working fields. When `exclude_leaves` is true the
    /// histogram (leaves only) is preserved — spec §3 invariant 5.
    fn reset_node(&mut self, idx: usize, exclude_leaves: bool) {
        let node = &mut self.nodes[idx];
        node.total_sum = 0.0;
        node.optimal_sum = 0.0;
        node.left_sum = 0.0;
        node.right_sum = 0.0;
        node.shape.optimal_start = node.shape.first;
        node.shape.optimal_end = node.shape.last;
        node.total_pos = 0;
        node.total_neg = 0;
        node.opt_pos = 0;
        node.opt_neg = 0;
        node.left_pos = 0;
        node.left_neg = 0;
        node.right_pos = 0;
        node.right_neg = 0;
        if !exclude_leaves {
            for h in node.hist.iter_mut() {
                *h = 0;
            }
        }
    }

    /// Resets the whole tree. `exclude_leaves = true` clears every node's
    /// working totals but keeps leaf histograms (used between A-axis
    /// intervals sharing the same accumulated rows); `false` additionally
    /// zeroes histograms (used when moving to a brand new A-axis interval).
    pub fn reset(&mut self, exclude_leaves: bool) {
        for idx in 0..self.nodes.len() {
            self.reset_node(idx, exclude_leaves);
        }
    }

    /// Resets just the root. `update_tree` already resets every non-root
    /// node as it folds each child into its parent, so only the root is
    /// left dirty after a query — this is the cheap per-class reset used
    /// between successive `set_leaves_for_class` passes over the same
    /// accumulated rows.
    pub fn reset_root(&mut self, exclude_leaves: bool) {
        self.reset_node(self.root.idx(), exclude_leaves);
    }

    /// `(optimal_start, optimal_end, pos, neg)` for the tree's current
    /// objective pass.
    pub fn root_optimal(&self) -> (usize, usize, u32, u32) {
        let root = &self.nodes[self.root.idx()];
        (root.shape.optimal_start, root.shape.optimal_end, root.opt_pos, root.opt_neg)
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }
}
