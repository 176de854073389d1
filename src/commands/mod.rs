//! Command entry points

pub mod sync;

pub use sync::{run, run_loop, PassReport, Synchronizer};
