//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::UntetheredEntry;
use crate::storage::ReportStorage;

/// Writes the report to one file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    report_path: PathBuf,
}

impl LocalStorage {
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: report_path.into(),
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let path = &self.report_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(&bytes).await
    }
}

#[async_trait]
impl ReportStorage for LocalStorage {
    async fn write_untethered(&self, entries: &[UntetheredEntry]) -> Result<String> {
        self.write_json(entries).await?;
        log::info!(
            "Wrote {} untethered entries to {}",
            entries.len(),
            self.report_path.display()
        );
        Ok(self.report_path.display().to_string())
    }
}
