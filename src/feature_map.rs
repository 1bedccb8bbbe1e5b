//! Result containers: the `cols x cols` grid of per-pair box lists
//! produced by a full search (`FeatureMap`), a flat ordered list of boxes
//! (`ProjectionList`, the decision-list builders' output shape), and the
//! CSV-shape serialization for both (spec §6).

use crate::projection::{Payload, ProjectionBox};

/// A flat, ordered sequence of boxes — the shape returned by the
/// decision-list builders.
pub type ProjectionList = Vec<ProjectionBox>;

/// `cols x cols` grid of box lists keyed by `(i, j)` with `i < j`
/// (spec §6: "Result record — FeatureMap").
#[derive(Debug, Clone)]
pub struct FeatureMap {
    cols: usize,
    slots: Vec<Vec<ProjectionBox>>,
}

impl FeatureMap {
    pub fn new(cols: usize) -> Self {
        Self {
            cols,
            slots: (0..cols * cols).map(|_| Vec::new()).collect(),
        }
    }

    fn index(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    /// Boxes found for the ordered column pair `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> &[ProjectionBox] {
        &self.slots[self.index(i, j)]
    }

    /// Replaces the box list for `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, boxes: Vec<ProjectionBox>) {
        let idx = self.index(i, j);
        self.slots[idx] = boxes;
    }

    /// Every `(i, j, &ProjectionBox)` triple across the whole grid, in
    /// `(i, j)` order then insertion order within a slot.
    pub fn iter_all(&self) -> impl Iterator<Item = (usize, usize, &ProjectionBox)> {
        self.slots.iter().enumerate().flat_map(move |(idx, boxes)| {
            let i = idx / self.cols;
            let j = idx % self.cols;
            boxes.iter().map(move |pr| (i, j, pr))
        })
    }

    pub fn num_projections(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Renders the whole grid as one CSV document, per the header shape of
    /// spec §6 — classification or numeric, inferred from the first box
    /// found (an empty map renders as an empty string).
    pub fn to_csv(&self) -> String {
        projections_to_csv(self.iter_all().map(|(_, _, pr)| pr))
    }
}

/// Renders `projections` as one CSV document (spec §6's two header
/// shapes). An empty iterator renders as an empty string. Mixed
/// classification/numeric input is a caller bug (a search never produces
/// both in the same run) — only the first box's kind is honored.
pub fn projections_to_csv<'a>(projections: impl Iterator<Item = &'a ProjectionBox>) -> String {
    let mut out = String::new();
    let mut header_written = false;

    for pr in projections {
        if !header_written {
            out.push_str(match pr.payload {
                Payload::Classification { .. } => "Class,Dim1,Dim2,Score,xmin,xmax,ymin,ymax,Pos,Neg,Purity\n",
                Payload::Numeric { .. } => "Dim1,Dim2,xmin,xmax,ymin,ymax,Total,Mean,Sum-Sq-Error\n",
            });
            header_written = true;
        }
        write_row(&mut out, pr);
    }

    out
}

fn write_row(out: &mut String, pr: &ProjectionBox) {
    use std::fmt::Write;
    match &pr.payload {
        Payload::Classification { class_label, pos, neg } => {
            let purity = *pos as f64 / (pos + neg) as f64;
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{}",
                class_label,
                pr.att1,
                pr.att2,
                *pos as i64 - *neg as i64,
                pr.att1_range.0,
                pr.att1_range.1,
                pr.att2_range.0,
                pr.att2_range.1,
                pos,
                neg,
                purity,
            );
        }
        Payload::Numeric { total, mean, sum_sq_error } => {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{}",
                pr.att1, pr.att2, pr.att1_range.0, pr.att1_range.1, pr.att2_range.0, pr.att2_range.1, total, mean, sum_sq_error,
            );
        }
    }
}
