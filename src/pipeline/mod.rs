//! Reconciliation pipeline.
//!
//! - `DiffCalculator`: compares both libraries through the arm index
//! - `apply_updates`: writes the resulting updates to AniList
//! - `run_sync`: one full pass, fetch to report

pub mod apply;
pub mod diff;
pub mod progress;
pub mod sync;

pub use apply::{ApplyOutcome, MediaListWriter, apply_updates};
pub use diff::{DiffCalculator, DiffResult};
pub use progress::progress_for;
pub use sync::{SyncClients, SyncSummary, run_sync};
