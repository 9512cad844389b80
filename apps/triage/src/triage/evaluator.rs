//! Semantic Evaluator: the narrow seam to the external reasoning capability.
//!
//! `SemanticEvaluator` returns raw text only. Turning that text into an
//! `EvaluatorResponse` (with its fallback) happens in `parse_evaluation`, so
//! every implementation, real or stubbed, gets the same tolerance.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::TriageError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, LlmClient};
use crate::models::firm::FirmProfile;
use crate::models::opportunity::{AggregatedOpportunity, Requirement};
use crate::models::report::Finding;
use crate::triage::keywords::MAX_EVALUATOR_REQUIREMENTS;
use crate::triage::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATOR_SYSTEM};

pub const FALLBACK_SUMMARY: &str = "Analysis failed";

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityContext {
    pub agency: Option<String>,
    pub title: Option<String>,
    pub scope_summary: Option<String>,
    pub key_tasks: Vec<String>,
    pub certifications_required: Vec<String>,
    pub evaluation_criteria: Vec<String>,
    pub sample_requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonnelContext {
    pub name: Value,
    pub expertise: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirmContext {
    pub core_competencies: Value,
    pub specialized_expertise: Value,
    pub past_performance: Vec<Value>,
    pub key_personnel: Vec<PersonnelContext>,
}

/// Everything the evaluator is allowed to see about one solicitation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    pub opportunity: OpportunityContext,
    pub firm: FirmContext,
    pub knockouts: Vec<Finding>,
    pub matches: Vec<Finding>,
}

impl EvaluationRequest {
    pub fn build(
        opportunity: &AggregatedOpportunity,
        firm: &FirmProfile,
        knockouts: &[Finding],
        matches: &[Finding],
    ) -> Self {
        Self {
            opportunity: OpportunityContext {
                agency: opportunity.agency.clone(),
                title: opportunity.title.clone(),
                scope_summary: opportunity.scope_summary.clone(),
                key_tasks: opportunity.key_tasks.clone(),
                certifications_required: opportunity.certifications_required.clone(),
                evaluation_criteria: opportunity.evaluation_criteria.clone(),
                sample_requirements: opportunity
                    .requirements
                    .iter()
                    .take(MAX_EVALUATOR_REQUIREMENTS)
                    .cloned()
                    .collect(),
            },
            firm: FirmContext {
                core_competencies: firm.capabilities.core_competencies.clone(),
                specialized_expertise: firm.capabilities.specialized_expertise.clone(),
                past_performance: firm
                    .past_performance
                    .iter()
                    .map(|pp| pp.relevance_points.clone())
                    .collect(),
                key_personnel: firm
                    .key_personnel
                    .iter()
                    .map(|p| PersonnelContext {
                        name: p.name.clone(),
                        expertise: p.expertise.clone(),
                    })
                    .collect(),
            },
            knockouts: knockouts.to_vec(),
            matches: matches.to_vec(),
        }
    }

    /// Renders the request into the evaluation prompt.
    ///
    /// The opportunity goes in last: it is partner-supplied text and must not be
    /// rescanned for the other placeholders.
    pub fn render_prompt(&self) -> Result<String, TriageError> {
        Ok(EVALUATION_PROMPT_TEMPLATE
            .replace("{firm_json}", &serde_json::to_string_pretty(&self.firm)?)
            .replace("{knockouts_json}", &serde_json::to_string(&self.knockouts)?)
            .replace("{matches_json}", &serde_json::to_string(&self.matches)?)
            .replace(
                "{opportunity_json}",
                &serde_json::to_string_pretty(&self.opportunity)?,
            ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response
// ────────────────────────────────────────────────────────────────────────────

/// Structured judgment returned by the evaluator. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorResponse {
    #[serde(default, deserialize_with = "lenient_findings")]
    pub additional_matches: Vec<Finding>,
    #[serde(default, deserialize_with = "lenient_findings")]
    pub gaps: Vec<Finding>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical_summary: String,
    #[serde(default, deserialize_with = "lenient_names")]
    pub recommended_personnel: Vec<String>,
    /// Unclamped; the scorer bounds it.
    #[serde(default, deserialize_with = "lenient_adjustment")]
    pub score_adjustment: i64,
}

impl EvaluatorResponse {
    /// Substituted when the evaluator's text cannot be parsed at all.
    pub fn fallback() -> Self {
        Self {
            technical_summary: FALLBACK_SUMMARY.to_string(),
            ..Default::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts plain strings and `{"name": ...}` objects; anything else is skipped.
fn lenient_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Object(o) => o.get("name").and_then(|n| n.as_str()).map(str::to_string),
            _ => None,
        })
        .collect())
}

/// Objects become findings and plain strings become the detail of an untyped
/// finding. Anything else is skipped.
fn lenient_findings<'de, D>(deserializer: D) -> Result<Vec<Finding>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(Finding::matched("", s)),
            obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
            _ => None,
        })
        .collect())
}

/// Numbers and numeric strings ("+5", "-12.5") truncate toward zero; anything else is 0.
fn lenient_adjustment<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let parsed = match &raw {
        None | Some(Value::Null) => Some(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('+').parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed.filter(|f| f.is_finite()) {
        Some(f) => Ok(f.trunc() as i64),
        None => {
            warn!("Non-numeric score_adjustment {:?}; treating as 0", raw);
            Ok(0)
        }
    }
}

/// Parses evaluator text: as-is, then the outermost `{ .. }` span, then the fallback.
/// Never fails.
pub fn parse_evaluation(text: &str) -> EvaluatorResponse {
    let text = strip_json_fences(text);

    if let Ok(response) = serde_json::from_str::<EvaluatorResponse>(text) {
        return response;
    }

    if let Some(span) = embedded_object_span(text) {
        if let Ok(response) = serde_json::from_str::<EvaluatorResponse>(span) {
            return response;
        }
    }

    warn!("Semantic evaluator returned unparseable output; using fallback response");
    EvaluatorResponse::fallback()
}

/// From the first `{` to the last `}`, inclusive.
fn embedded_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// ────────────────────────────────────────────────────────────────────────────
// Trait + LLM-backed implementation
// ────────────────────────────────────────────────────────────────────────────

/// The injectable evaluator seam. One call per solicitation.
#[async_trait]
pub trait SemanticEvaluator: Send + Sync {
    /// Returns the evaluator's raw text. Transport failures are errors;
    /// unparseable text is not.
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String, TriageError>;
}

/// Evaluates via Claude through the shared `LlmClient`.
pub struct LlmSemanticEvaluator {
    llm: LlmClient,
    system: String,
}

impl LlmSemanticEvaluator {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            system: format!("{EVALUATOR_SYSTEM} {JSON_ONLY_SYSTEM}"),
        }
    }
}

#[async_trait]
impl SemanticEvaluator for LlmSemanticEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String, TriageError> {
        let prompt = request.render_prompt()?;
        self.llm
            .call_text(&prompt, &self.system)
            .await
            .map_err(|e| TriageError::Evaluator(format!("Semantic evaluation failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::firm::{KeyPersonnel, PastPerformance};
    use crate::triage::normalizer::normalize;
    use serde_json::json;

    #[test]
    fn test_parses_clean_json() {
        let text = r#"{
            "additional_matches": [{"type": "Cloud", "detail": "FedRAMP migrations at DHS"}],
            "gaps": [{"type": "Staffing", "detail": "No on-site PM", "mitigation": "Hire"}],
            "technical_summary": "Solid fit.",
            "recommended_personnel": ["Dana Reyes"],
            "score_adjustment": 8
        }"#;
        let response = parse_evaluation(text);
        assert_eq!(response.additional_matches.len(), 1);
        assert_eq!(response.gaps[0].mitigation.as_deref(), Some("Hire"));
        assert_eq!(response.technical_summary, "Solid fit.");
        assert_eq!(response.recommended_personnel, vec!["Dana Reyes"]);
        assert_eq!(response.score_adjustment, 8);
    }

    #[test]
    fn test_parses_embedded_object_span() {
        let text = "Here is my analysis:\n\
                    {\"technical_summary\": \"Good\", \"score_adjustment\": -4}\n\
                    Thanks!";
        let response = parse_evaluation(text);
        assert_eq!(response.technical_summary, "Good");
        assert_eq!(response.score_adjustment, -4);
    }

    #[test]
    fn test_parses_fenced_json() {
        let text = "```json\n{\"technical_summary\": \"Fenced\"}\n```";
        assert_eq!(parse_evaluation(text).technical_summary, "Fenced");
    }

    #[test]
    fn test_unparseable_text_uses_fallback() {
        for text in ["I cannot help with that.", "", "{ broken json", "} backwards {"] {
            let response = parse_evaluation(text);
            assert_eq!(response, EvaluatorResponse::fallback());
            assert_eq!(response.technical_summary, "Analysis failed");
            assert_eq!(response.score_adjustment, 0);
            assert!(response.additional_matches.is_empty());
        }
    }

    #[test]
    fn test_string_and_fractional_adjustments() {
        assert_eq!(parse_evaluation(r#"{"score_adjustment": "+5"}"#).score_adjustment, 5);
        assert_eq!(parse_evaluation(r#"{"score_adjustment": "-12.7"}"#).score_adjustment, -12);
        assert_eq!(parse_evaluation(r#"{"score_adjustment": 7.9}"#).score_adjustment, 7);
        assert_eq!(parse_evaluation(r#"{"score_adjustment": "a lot"}"#).score_adjustment, 0);
        assert_eq!(parse_evaluation(r#"{"score_adjustment": null}"#).score_adjustment, 0);
        assert_eq!(parse_evaluation(r#"{"score_adjustment": 45}"#).score_adjustment, 45);
    }

    #[test]
    fn test_nulls_and_missing_fields_default() {
        let response = parse_evaluation(r#"{"gaps": null, "technical_summary": null}"#);
        assert!(response.gaps.is_empty());
        assert!(response.technical_summary.is_empty());
        assert!(response.recommended_personnel.is_empty());
    }

    #[test]
    fn test_personnel_objects_are_reduced_to_names() {
        let response = parse_evaluation(
            r#"{"recommended_personnel": ["A. Lee", {"name": "B. Cho", "role": "PM"}, 3]}"#,
        );
        assert_eq!(response.recommended_personnel, vec!["A. Lee", "B. Cho"]);
    }

    #[test]
    fn test_string_findings_keep_the_rest_of_the_response() {
        let response = parse_evaluation(
            r#"{
                "additional_matches": ["FedRAMP migrations at DHS", {"type": "Cloud", "detail": "AWS GovCloud"}, 4],
                "gaps": ["No on-site PM"],
                "technical_summary": "Strong fit.",
                "score_adjustment": 15
            }"#,
        );
        assert_eq!(response.technical_summary, "Strong fit.");
        assert_eq!(response.score_adjustment, 15);
        assert_eq!(response.additional_matches.len(), 2);
        assert_eq!(response.additional_matches[0].detail, "FedRAMP migrations at DHS");
        assert_eq!(response.additional_matches[1].category, "Cloud");
        assert_eq!(response.gaps.len(), 1);
        assert_eq!(response.gaps[0].detail, "No on-site PM");
    }

    #[test]
    fn test_placeholder_text_in_opportunity_is_left_alone() {
        let opp = normalize(&json!({
            "solicitation_number": "RFP-10",
            "agency": "Literal {firm_json} and {matches_json}"
        }));
        let prompt = EvaluationRequest::build(&opp, &FirmProfile::default(), &[], &[])
            .render_prompt()
            .unwrap();
        assert!(prompt.contains("Literal {firm_json} and {matches_json}"));
    }

    #[test]
    fn test_request_caps_requirements_at_thirty() {
        let responsibilities: Vec<String> = (0..45).map(|i| format!("Task {i}")).collect();
        let opp = normalize(&json!({
            "solicitation_number": "RFP-9",
            "scope_of_work": {"contractor_responsibilities": responsibilities}
        }));
        let request = EvaluationRequest::build(&opp, &FirmProfile::default(), &[], &[]);
        assert_eq!(request.opportunity.sample_requirements.len(), 30);
        assert_eq!(request.opportunity.sample_requirements[29].text, "Task 29");
    }

    #[test]
    fn test_render_prompt_includes_context() {
        let opp = normalize(&json!({
            "solicitation_number": "RFP-9",
            "agency": "GSA",
            "scope_of_work": {"key_items": ["Help desk"]}
        }));
        let firm = FirmProfile {
            past_performance: vec![PastPerformance {
                relevance_points: json!(["Tier 2 support for VA"]),
            }],
            key_personnel: vec![KeyPersonnel {
                name: json!("Dana Reyes"),
                expertise: json!("ITIL"),
            }],
            ..Default::default()
        };
        let matches = vec![Finding::matched(
            "NAICS Match",
            "Firm NAICS codes match: 541512".to_string(),
        )];
        let prompt = EvaluationRequest::build(&opp, &firm, &[], &matches)
            .render_prompt()
            .unwrap();

        assert!(prompt.contains("\"agency\": \"GSA\""));
        assert!(prompt.contains("Help desk"));
        assert!(prompt.contains("Tier 2 support for VA"));
        assert!(prompt.contains("Dana Reyes"));
        assert!(prompt.contains("Firm NAICS codes match: 541512"));
        assert!(!prompt.contains("{opportunity_json}"));
        assert!(!prompt.contains("{matches_json}"));
    }
}
