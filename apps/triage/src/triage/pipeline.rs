//! Triage Pipeline: runs normalize → rules → score → persist for each record in a batch.
//!
//! Records are processed one at a time with no state carried between them. A
//! failure while scoring or persisting one record becomes an ERROR placeholder
//! and the batch moves on; only a failure to write the run summary is returned.

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use crate::errors::TriageError;
use crate::models::firm::FirmProfile;
use crate::models::opportunity::AggregatedOpportunity;
use crate::models::report::{FailedReport, ReportRecord, RunSummary, SummaryEntry, TriageReport};
use crate::storage::ReportSink;
use crate::triage::evaluator::SemanticEvaluator;
use crate::triage::fit_scoring::score;
use crate::triage::normalizer::normalize;
use crate::triage::rules::evaluate_rules;

pub const SOURCE_LABEL: &str = "partner_api";

pub struct TriagePipeline<'a> {
    firm: &'a FirmProfile,
    evaluator: &'a dyn SemanticEvaluator,
    sink: &'a dyn ReportSink,
}

impl<'a> TriagePipeline<'a> {
    pub fn new(
        firm: &'a FirmProfile,
        evaluator: &'a dyn SemanticEvaluator,
        sink: &'a dyn ReportSink,
    ) -> Self {
        Self {
            firm,
            evaluator,
            sink,
        }
    }

    /// Rules then scoring for one normalized opportunity.
    pub async fn triage(
        &self,
        opportunity: &AggregatedOpportunity,
    ) -> Result<TriageReport, TriageError> {
        let outcome = evaluate_rules(opportunity, self.firm);
        score(opportunity, self.firm, outcome, self.evaluator).await
    }

    /// Runs every record and writes the run summary.
    pub async fn run_batch(&self, records: &[Value]) -> Result<RunSummary, TriageError> {
        let total = records.len();
        let mut results = Vec::with_capacity(total);

        for (idx, raw) in records.iter().enumerate() {
            let opportunity = normalize(raw);
            info!(
                "[{}/{}] Scoring {}: {} (agency: {}, NAICS: {})",
                idx + 1,
                total,
                opportunity.id,
                opportunity.title.as_deref().unwrap_or("Unknown"),
                opportunity.agency.as_deref().unwrap_or("Unknown"),
                join_codes(&opportunity),
            );
            let record = self.process(&opportunity).await;
            results.push(SummaryEntry::from(&record));
        }

        let summary = RunSummary {
            processed_at: Utc::now().to_rfc3339(),
            source: SOURCE_LABEL.to_string(),
            total: results.len(),
            results,
        };
        self.sink.write_summary(&summary).await?;
        Ok(summary)
    }

    async fn process(&self, opportunity: &AggregatedOpportunity) -> ReportRecord {
        let record = match self.triage(opportunity).await {
            Ok(report) => {
                info!(
                    "{}: score {}/100, {} ({} knockouts, {} strong matches)",
                    report.rfp_id,
                    report.match_score,
                    report.recommendation.as_str(),
                    report.knockouts.len(),
                    report.strong_matches.len()
                );
                ReportRecord::Scored(report)
            }
            Err(e) => {
                error!("ERROR scoring {}: {e}", opportunity.id);
                failed_record(opportunity, &e)
            }
        };

        match self.sink.write_report(&record).await {
            Ok(()) => record,
            Err(e) => {
                error!("Failed to persist report for {}: {e}", opportunity.id);
                failed_record(opportunity, &e)
            }
        }
    }
}

fn failed_record(opportunity: &AggregatedOpportunity, err: &TriageError) -> ReportRecord {
    ReportRecord::Failed(FailedReport::new(
        opportunity.id.clone(),
        opportunity.agency.clone(),
        err.to_string(),
    ))
}

fn join_codes(opportunity: &AggregatedOpportunity) -> String {
    opportunity
        .classification_codes
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Logs one line per result, ids truncated to 28 characters.
pub fn log_summary_table(summary: &RunSummary) {
    info!("TRIAGE SUMMARY ({} solicitations)", summary.total);
    info!("{:<30} {:<10} {:<15} {:<10}", "RFP", "SCORE", "RECOMMENDATION", "KNOCKOUTS");
    for entry in &summary.results {
        let display_id: String = entry.rfp_id.chars().take(28).collect();
        info!(
            "{:<30} {:<10} {:<15} {:<10}",
            display_id,
            entry.score,
            entry.recommendation.as_str(),
            entry.knockout_count
        );
    }
}
