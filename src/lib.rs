//! Exhaustive search for statistically interesting axis-aligned
//! projection boxes over pairs of numeric columns in a tabular dataset.
//!
//! For a classification output, "interesting" means high purity (share
//! of one class inside the box); for a numeric output, it means low
//! variance, high mean, or low mean, selectable via [`config::Mode`].
//! The search runs over every ordered pair of input columns, optionally
//! across a worker-pool of threads (`dispatch`), and feeds a greedy
//! decision-list builder (`decision_list`) that repeatedly re-runs the
//! search after deleting already-explained rows.
//!
//! Callers implement [`Dataset`] over their own storage; [`ArrayDataset`]
//! is a minimal in-memory reference implementation used by this crate's
//! own tests. The three public entry points are [`search_projections`],
//! [`find_easy_explain_data`] and [`find_class_nuggets`].
//!
//! Data ingest, CLI/scripting bindings, and result formatting/file
//! output are treated as external concerns and are out of scope here.

pub mod config;
pub mod dataset;
pub mod decision_list;
pub mod dispatch;
pub mod error;
pub mod feature_map;
pub mod interval;
pub mod leaf;
pub mod pair;
pub mod projection;
pub mod search;
pub mod sorted_index;
pub mod tree;

pub use config::{DecisionListParams, Mode, SearchParams};
pub use dataset::{ArrayDataset, Dataset};
pub use decision_list::DecisionListOutcome;
pub use error::{Error, Result};
pub use feature_map::{FeatureMap, ProjectionList};
pub use projection::{Payload, ProjectionBox};
pub use search::{find_class_nuggets, find_easy_explain_data, search_projections, SearchOutcome, SearchStats};
