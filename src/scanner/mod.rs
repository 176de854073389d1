//! Directory scanning: tree walker and snapshot builder

mod snapshot;
mod walker;

pub use snapshot::build_snapshot;
pub use walker::{TreeWalker, WalkOutput};
