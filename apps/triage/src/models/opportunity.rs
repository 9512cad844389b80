use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a single requirement. Only mandatory requirements are produced today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    #[default]
    Mandatory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub text: String,
    pub source_label: String,
    pub requirement_kind: RequirementKind,
}

/// Canonical solicitation record produced by the normalizer.
///
/// Ephemeral: lives for one pipeline pass only. `set_aside_categories` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedOpportunity {
    pub id: String,
    pub agency: Option<String>,
    pub title: Option<String>,
    pub classification_codes: BTreeSet<String>,
    pub set_aside_categories: Vec<String>,
    pub deadline: Option<String>,
    pub period_of_performance: Option<String>,
    pub contract_value_indicator: Option<String>,
    pub requirements: Vec<Requirement>,
    pub certifications_required: Vec<String>,
    pub clearances_required: Vec<String>,
    pub key_tasks: Vec<String>,
    pub evaluation_criteria: Vec<String>,
    pub documents_analyzed: Vec<String>,
    pub primary_document: Option<String>,

    // Passthrough
    pub scope_summary: Option<String>,
    pub contacts: Option<Value>,
    pub important_dates: Option<Value>,
    pub compliance_requirements: Option<Value>,
    pub solicitation_number: Option<String>,
    pub notice_type: Option<String>,
    pub posted_date: Option<String>,
    pub original_url: Option<String>,
    pub naics_description: Option<String>,
    pub set_aside_percentage: Option<Value>,
    pub size_standard: Option<Value>,
}
