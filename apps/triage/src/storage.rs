use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::errors::TriageError;
use crate::models::report::{ReportRecord, RunSummary};

pub const SUMMARY_FILE: &str = "triage_summary.json";

/// Destination for per-solicitation reports and the run summary.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write_report(&self, record: &ReportRecord) -> Result<(), TriageError>;
    async fn write_summary(&self, summary: &RunSummary) -> Result<(), TriageError>;
}

/// Writes one pretty-printed JSON file per `rfp_id` into a directory.
/// Re-running with the same id overwrites the earlier file.
pub struct JsonDirectorySink {
    dir: PathBuf,
}

impl JsonDirectorySink {
    pub async fn create(dir: &Path) -> Result<Self, TriageError> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            TriageError::Storage(format!("Failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn report_path(&self, rfp_id: &str) -> PathBuf {
        self.dir.join(report_file_name(rfp_id))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), TriageError> {
        let body = serde_json::to_string_pretty(value)?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| TriageError::Storage(format!("Failed to write {}: {e}", path.display())))
    }
}

#[async_trait]
impl ReportSink for JsonDirectorySink {
    async fn write_report(&self, record: &ReportRecord) -> Result<(), TriageError> {
        let path = self.report_path(record.rfp_id());
        self.write_json(&path, record).await?;
        info!("Report written: {}", path.display());
        Ok(())
    }

    async fn write_summary(&self, summary: &RunSummary) -> Result<(), TriageError> {
        let path = self.summary_path();
        self.write_json(&path, summary).await?;
        info!("Summary written: {}", path.display());
        Ok(())
    }
}

/// `triage_report_<id>.json`, with path separators in the id replaced by `_`.
pub fn report_file_name(rfp_id: &str) -> String {
    format!("triage_report_{}.json", rfp_id.replace('/', "_").replace('\\', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{FailedReport, Recommendation, SummaryEntry};

    fn failed(id: &str, error: &str) -> ReportRecord {
        ReportRecord::Failed(FailedReport::new(id.to_string(), None, error.to_string()))
    }

    #[test]
    fn test_report_file_name_replaces_separators() {
        assert_eq!(report_file_name("W91/24\\R-0001"), "triage_report_W91_24_R-0001.json");
        assert_eq!(report_file_name("Unknown"), "triage_report_Unknown.json");
    }

    #[tokio::test]
    async fn test_write_report_creates_file_keyed_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirectorySink::create(&dir.path().join("out")).await.unwrap();

        sink.write_report(&failed("A/1", "boom")).await.unwrap();

        let written = std::fs::read_to_string(sink.report_path("A/1")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["rfp_id"], "A/1");
        assert_eq!(value["recommendation"], "ERROR");
    }

    #[tokio::test]
    async fn test_rewrite_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirectorySink::create(dir.path()).await.unwrap();

        sink.write_report(&failed("R-1", "first")).await.unwrap();
        sink.write_report(&failed("R-1", "second")).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let written = std::fs::read_to_string(sink.report_path("R-1")).unwrap();
        assert!(written.contains("second"));
    }

    #[tokio::test]
    async fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirectorySink::create(dir.path()).await.unwrap();
        let summary = RunSummary {
            processed_at: "2024-06-01T00:00:00+00:00".to_string(),
            source: "partner_api".to_string(),
            total: 1,
            results: vec![SummaryEntry {
                rfp_id: "R-1".to_string(),
                score: 80,
                recommendation: Recommendation::Go,
                knockout_count: 0,
                agency: Some("GSA".to_string()),
            }],
        };

        sink.write_summary(&summary).await.unwrap();

        let written = std::fs::read_to_string(sink.summary_path()).unwrap();
        let parsed: RunSummary = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, summary);
    }
}
