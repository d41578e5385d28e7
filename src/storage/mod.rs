//! Storage for sync reports.
//!
//! A pass writes the untethered report: every library record that has no
//! cross-reference counterpart, as a pretty-printed JSON array.
//!
//! ```text
//! [
//!   { "source": "Annict", "id": 1234, "title": "..." },
//!   { "source": "AniList", "id": 98765, "title": "..." }
//! ]
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::UntetheredEntry;

pub use local::LocalStorage;

/// Trait for report storage backends.
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Replace the untethered report. Returns where it was written.
    async fn write_untethered(&self, entries: &[UntetheredEntry]) -> Result<String>;
}
