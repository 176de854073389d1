//! Diff engine - key-set comparison and change detection

mod compare;
mod plan;

pub use compare::{detect_change, ChangeCheck};
pub use plan::{compute_diff, depth, sort_deepest_first, sort_shallowest_first, DiffResult};
