//! Fit Scoring: combines rule findings with the semantic evaluator's judgment
//! into a bounded score, a recommendation and the final `TriageReport`.
//!
//! Score = 70 − 30·knockouts + min(5·matches, 25) − min(5·gaps, 15) + clamp(adjustment, ±20),
//! clamped to 0 – 100. Any knockout forces NO-GO regardless of the arithmetic.

use chrono::Utc;
use tracing::debug;

use crate::errors::TriageError;
use crate::models::firm::FirmProfile;
use crate::models::opportunity::AggregatedOpportunity;
use crate::models::report::{Recommendation, TriageReport};
use crate::triage::evaluator::{
    parse_evaluation, EvaluationRequest, EvaluatorResponse, SemanticEvaluator,
};
use crate::triage::rules::RuleOutcome;

const BASE_SCORE: i64 = 70;
const KNOCKOUT_PENALTY: i64 = 30;
const MATCH_BONUS: i64 = 5;
const MAX_MATCH_BONUS: i64 = 25;
const GAP_PENALTY: i64 = 5;
const MAX_GAP_PENALTY: i64 = 15;
const MAX_LLM_ADJUSTMENT: i64 = 20;

pub const GO_THRESHOLD: u8 = 70;
pub const CONDITIONAL_THRESHOLD: u8 = 45;

/// Intermediate terms of the score, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub knockout_penalty: i64,
    pub match_bonus: i64,
    pub gap_penalty: i64,
    pub llm_adjustment: i64,
    pub final_score: u8,
}

/// Only the counts matter; finding order is display order.
pub fn compute_score(
    knockout_count: usize,
    match_count: usize,
    gap_count: usize,
    score_adjustment: i64,
) -> ScoreBreakdown {
    let knockout_penalty = KNOCKOUT_PENALTY.saturating_mul(as_i64(knockout_count));
    let match_bonus = MATCH_BONUS.saturating_mul(as_i64(match_count)).min(MAX_MATCH_BONUS);
    let gap_penalty = GAP_PENALTY.saturating_mul(as_i64(gap_count)).min(MAX_GAP_PENALTY);
    let llm_adjustment = score_adjustment.clamp(-MAX_LLM_ADJUSTMENT, MAX_LLM_ADJUSTMENT);

    let raw = BASE_SCORE
        .saturating_sub(knockout_penalty)
        .saturating_add(match_bonus)
        .saturating_sub(gap_penalty)
        .saturating_add(llm_adjustment);

    ScoreBreakdown {
        knockout_penalty,
        match_bonus,
        gap_penalty,
        llm_adjustment,
        final_score: raw.clamp(0, 100) as u8,
    }
}

fn as_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Knockouts override the score. Without knockouts: ≥70 GO, ≥45 CONDITIONAL, else NO-GO.
pub fn recommend(final_score: u8, has_knockouts: bool) -> Recommendation {
    if has_knockouts {
        Recommendation::NoGo
    } else if final_score >= GO_THRESHOLD {
        Recommendation::Go
    } else if final_score >= CONDITIONAL_THRESHOLD {
        Recommendation::Conditional
    } else {
        Recommendation::NoGo
    }
}

/// Asks the evaluator for its judgment and assembles the report.
///
/// Unparseable evaluator output is absorbed by the fallback response; only a
/// transport failure from the evaluator is returned as an error.
pub async fn score(
    opportunity: &AggregatedOpportunity,
    firm: &FirmProfile,
    outcome: RuleOutcome,
    evaluator: &dyn SemanticEvaluator,
) -> Result<TriageReport, TriageError> {
    let request = EvaluationRequest::build(opportunity, firm, &outcome.knockouts, &outcome.matches);
    let raw = evaluator.evaluate(&request).await?;
    let response = parse_evaluation(&raw);
    Ok(build_report(opportunity, outcome, response))
}

/// Pure assembly of the report from rule findings and a parsed evaluator response.
pub fn build_report(
    opportunity: &AggregatedOpportunity,
    outcome: RuleOutcome,
    response: EvaluatorResponse,
) -> TriageReport {
    let RuleOutcome {
        knockouts,
        mut matches,
        naics_match,
        set_aside_eligible,
    } = outcome;
    let EvaluatorResponse {
        additional_matches,
        gaps,
        technical_summary,
        recommended_personnel,
        score_adjustment,
    } = response;

    matches.extend(additional_matches);

    let breakdown = compute_score(knockouts.len(), matches.len(), gaps.len(), score_adjustment);
    debug!("Score breakdown for {}: {:?}", opportunity.id, breakdown);

    TriageReport {
        rfp_id: opportunity.id.clone(),
        rfp_title: opportunity.title.clone(),
        agency: opportunity.agency.clone(),
        match_score: breakdown.final_score,
        recommendation: recommend(breakdown.final_score, !knockouts.is_empty()),
        knockouts,
        strong_matches: matches,
        gaps,
        naics_match,
        set_aside_eligible,
        technical_summary,
        recommended_personnel,
        documents_analyzed: opportunity.documents_analyzed.clone(),
        analysis_timestamp: Utc::now().to_rfc3339(),
        solicitation_number: opportunity.solicitation_number.clone(),
        deadline: opportunity.deadline.clone(),
        original_url: opportunity.original_url.clone(),
        posted_date: opportunity.posted_date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Finding;
    use crate::triage::normalizer::normalize;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedEvaluator(&'static str);

    #[async_trait]
    impl SemanticEvaluator for FixedEvaluator {
        async fn evaluate(&self, _request: &EvaluationRequest) -> Result<String, TriageError> {
            Ok(self.0.to_string())
        }
    }

    fn findings(category: &str, n: usize) -> Vec<Finding> {
        (0..n)
            .map(|i| Finding::matched(category, format!("{category} {i}")))
            .collect()
    }

    fn outcome(knockouts: usize, matches: usize) -> RuleOutcome {
        RuleOutcome {
            knockouts: (0..knockouts)
                .map(|i| Finding::knockout("Clearance Gap", format!("gap {i}")))
                .collect(),
            matches: findings("NAICS Match", matches),
            naics_match: true,
            set_aside_eligible: true,
        }
    }

    fn response(additional: usize, gaps: usize, adjustment: i64) -> EvaluatorResponse {
        EvaluatorResponse {
            additional_matches: findings("Technical", additional),
            gaps: findings("Gap", gaps),
            technical_summary: "Summary".to_string(),
            recommended_personnel: vec![],
            score_adjustment: adjustment,
        }
    }

    #[test]
    fn test_base_score_is_seventy() {
        assert_eq!(compute_score(0, 0, 0, 0).final_score, 70);
    }

    #[test]
    fn test_match_bonus_caps_at_25() {
        let b = compute_score(0, 9, 0, 0);
        assert_eq!(b.match_bonus, 25);
        assert_eq!(b.final_score, 95);
    }

    #[test]
    fn test_gap_penalty_caps_at_15() {
        let b = compute_score(0, 0, 10, 0);
        assert_eq!(b.gap_penalty, 15);
        assert_eq!(b.final_score, 55);
    }

    #[test]
    fn test_llm_adjustment_is_clamped() {
        assert_eq!(compute_score(0, 0, 0, 500).llm_adjustment, 20);
        assert_eq!(compute_score(0, 0, 0, -500).llm_adjustment, -20);
        assert_eq!(compute_score(0, 5, 0, 500).final_score, 100);
    }

    #[test]
    fn test_final_score_clamped_to_zero() {
        assert_eq!(compute_score(4, 0, 3, -20).final_score, 0);
        assert_eq!(compute_score(usize::MAX, 0, 0, 0).final_score, 0);
    }

    #[test]
    fn test_final_score_always_in_range() {
        for ko in 0..5 {
            for m in 0..8 {
                for g in 0..5 {
                    for adj in [-100, -20, -7, 0, 13, 20, 100] {
                        let s = compute_score(ko, m, g, adj).final_score;
                        assert!(s <= 100, "score {s} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn test_boundary_seventy_is_go() {
        let s = compute_score(0, 0, 0, 0).final_score;
        assert_eq!(s, 70);
        assert_eq!(recommend(s, false), Recommendation::Go);
    }

    #[test]
    fn test_boundary_forty_five_is_conditional() {
        let s = compute_score(0, 0, 3, -10).final_score;
        assert_eq!(s, 45);
        assert_eq!(recommend(s, false), Recommendation::Conditional);
    }

    #[test]
    fn test_boundary_forty_four_is_no_go() {
        let s = compute_score(0, 0, 3, -11).final_score;
        assert_eq!(s, 44);
        assert_eq!(recommend(s, false), Recommendation::NoGo);
    }

    #[test]
    fn test_boundary_sixty_nine_is_conditional() {
        assert_eq!(recommend(69, false), Recommendation::Conditional);
    }

    #[test]
    fn test_knockout_forces_no_go_despite_high_score() {
        // 70 - 30 + 25 + 20 = 85
        let report = build_report(
            &normalize(&json!({"id": "K-1"})),
            outcome(1, 5),
            response(0, 0, 20),
        );
        assert_eq!(report.match_score, 85);
        assert_eq!(report.recommendation, Recommendation::NoGo);
    }

    #[test]
    fn test_low_score_without_knockouts_is_no_go() {
        let report = build_report(
            &normalize(&json!({"id": "L-1"})),
            outcome(0, 0),
            response(0, 3, -20),
        );
        assert!(report.knockouts.is_empty());
        assert_eq!(report.match_score, 35);
        assert_eq!(report.recommendation, Recommendation::NoGo);
    }

    #[test]
    fn test_additional_matches_merge_into_strong_matches() {
        let report = build_report(
            &normalize(&json!({"id": "M-1"})),
            outcome(0, 2),
            response(3, 1, 0),
        );
        assert_eq!(report.strong_matches.len(), 5);
        assert_eq!(report.strong_matches[0].category, "NAICS Match");
        assert_eq!(report.strong_matches[2].category, "Technical");
        // 70 + 25 - 5
        assert_eq!(report.match_score, 90);
        assert_eq!(report.gaps.len(), 1);
    }

    #[test]
    fn test_report_carries_passthrough_fields() {
        let opp = normalize(&json!({
            "solicitation_number": "SN-7",
            "title": "Help Desk",
            "agency": "VA",
            "posted_date": "2024-03-01",
            "original_url": "https://sam.gov/opp/7",
            "important_dates": {"response_date": "2024-04-01"},
            "attachments": {"statement_of_work": "sow.pdf"}
        }));
        let report = build_report(&opp, outcome(0, 0), response(0, 0, 0));
        assert_eq!(report.rfp_id, "SN-7");
        assert_eq!(report.rfp_title.as_deref(), Some("Help Desk"));
        assert_eq!(report.solicitation_number.as_deref(), Some("SN-7"));
        assert_eq!(report.deadline.as_deref(), Some("2024-04-01"));
        assert_eq!(report.documents_analyzed, vec!["sow.pdf (Statement Of Work)"]);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.analysis_timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_unparseable_evaluator_output_still_reports() {
        let opp = normalize(&json!({"id": "U-1"}));
        let evaluator = FixedEvaluator("Sorry, I had trouble with that request.");
        let report = score(&opp, &FirmProfile::default(), outcome(0, 1), &evaluator)
            .await
            .unwrap();
        assert_eq!(report.technical_summary, "Analysis failed");
        // 70 + 5, adjustment treated as 0
        assert_eq!(report.match_score, 75);
        assert_eq!(report.recommendation, Recommendation::Go);
    }

    #[tokio::test]
    async fn test_score_uses_evaluator_judgment() {
        let opp = normalize(&json!({"id": "E-1"}));
        let evaluator = FixedEvaluator(
            r#"{"gaps": [{"type": "Past Performance", "detail": "No DoD work"}],
                "technical_summary": "Partial fit", "recommended_personnel": ["Dana"],
                "score_adjustment": -10}"#,
        );
        let report = score(&opp, &FirmProfile::default(), outcome(0, 0), &evaluator)
            .await
            .unwrap();
        // 70 - 5 - 10
        assert_eq!(report.match_score, 55);
        assert_eq!(report.recommendation, Recommendation::Conditional);
        assert_eq!(report.recommended_personnel, vec!["Dana"]);
        assert_eq!(report.technical_summary, "Partial fit");
    }
}
