//! Normalizer: maps a loosely structured partner record onto `AggregatedOpportunity`.
//!
//! Total and pure: every lookup is optional, anything missing or of the wrong
//! shape degrades to `None` or an empty container. Never returns an error.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::models::opportunity::{AggregatedOpportunity, Requirement, RequirementKind};
use crate::triage::keywords::{
    contains_any_ignore_case, CERTIFICATION_TERMS, CLEARANCE_TERMS, EVALUATION_CLAUSE_MARKERS,
    FULL_AND_OPEN, PRIMARY_DOCUMENT_PRIORITY, SCOPE_OF_WORK_LABEL, SMALL_BUSINESS_SET_ASIDE,
    UNKNOWN_ID,
};

/// Normalizes one unwrapped partner solicitation record.
pub fn normalize(sol: &Value) -> AggregatedOpportunity {
    let scope = section(sol, "scope_of_work");
    let project = section(sol, "project");
    let dates = section(sol, "important_dates");
    let compliance = section(sol, "compliance_requirements");
    let clauses = section(sol, "applicable_clauses");
    let attachments = section(sol, "attachments");

    let classification_codes = code_set(sol.get("naics_code"));

    let deadline = first_text(&[
        dates.and_then(|d| d.get("proposal_due_date")),
        dates.and_then(|d| d.get("response_date")),
        sol.get("deadline"),
    ]);

    let period_of_performance = first_text(&[
        project.and_then(|p| p.get("period_of_performance")),
        sol.get("period_of_performance"),
    ]);

    let requirements = text_list(scope.and_then(|s| s.get("contractor_responsibilities")))
        .into_iter()
        .map(|text| Requirement {
            text,
            source_label: SCOPE_OF_WORK_LABEL.to_string(),
            requirement_kind: RequirementKind::Mandatory,
        })
        .collect();

    let (certifications_required, clearances_required) = classify_compliance(compliance);

    let evaluation_criteria = text_list(clauses.and_then(|c| c.get("far_clauses")))
        .into_iter()
        .filter(|clause| is_evaluation_clause(clause))
        .collect();

    let documents_analyzed = attachments
        .map(|a| {
            a.iter()
                .map(|(doc_type, filename)| {
                    format!(
                        "{} ({})",
                        display_text(filename),
                        title_case(&doc_type.replace('_', " "))
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    AggregatedOpportunity {
        id: first_text(&[sol.get("solicitation_number"), sol.get("id")])
            .unwrap_or_else(|| UNKNOWN_ID.to_string()),
        agency: text_at(sol.get("agency")),
        title: text_at(sol.get("title")),
        classification_codes,
        set_aside_categories: set_aside_categories(sol, project),
        deadline,
        period_of_performance,
        contract_value_indicator: text_at(sol.get("contract_type")),
        requirements,
        certifications_required,
        clearances_required,
        key_tasks: text_list(scope.and_then(|s| s.get("key_items"))),
        evaluation_criteria,
        documents_analyzed,
        primary_document: attachments.and_then(pick_primary_document),
        scope_summary: text_at(scope.and_then(|s| s.get("summary"))),
        contacts: sol.get("contacts").filter(|v| !v.is_null()).cloned(),
        important_dates: dates.map(|d| Value::Object(d.clone())),
        compliance_requirements: compliance.map(|c| Value::Object(c.clone())),
        solicitation_number: text_at(sol.get("solicitation_number")),
        notice_type: text_at(sol.get("notice_type")),
        posted_date: text_at(sol.get("posted_date")),
        original_url: text_at(sol.get("original_url")),
        naics_description: text_at(sol.get("naics_description")),
        set_aside_percentage: sol.get("set_aside_percentage").filter(|v| !v.is_null()).cloned(),
        size_standard: sol.get("size_standard").filter(|v| !v.is_null()).cloned(),
    }
}

/// Exactly one category under the current rules.
fn set_aside_categories(sol: &Value, project: Option<&Map<String, Value>>) -> Vec<String> {
    let category = if is_truthy(sol.get("small_business_set_aside")) {
        text_at(project.and_then(|p| p.get("competition_type")))
            .unwrap_or_else(|| SMALL_BUSINESS_SET_ASIDE.to_string())
    } else {
        FULL_AND_OPEN.to_string()
    };
    vec![category]
}

/// Splits string-valued compliance entries into (certifications, clearances).
/// A value matching both term lists lands in both.
fn classify_compliance(compliance: Option<&Map<String, Value>>) -> (Vec<String>, Vec<String>) {
    let mut certifications = Vec::new();
    let mut clearances = Vec::new();

    for value in compliance.into_iter().flat_map(|c| c.values()) {
        let Some(text) = value.as_str() else {
            continue;
        };
        if contains_any_ignore_case(text, CLEARANCE_TERMS)
            && !clearances.iter().any(|c| c == text)
        {
            clearances.push(text.to_string());
        }
        if contains_any_ignore_case(text, CERTIFICATION_TERMS)
            && !certifications.iter().any(|c| c == text)
        {
            certifications.push(text.to_string());
        }
    }

    (certifications, clearances)
}

fn is_evaluation_clause(clause: &str) -> bool {
    contains_any_ignore_case(clause, EVALUATION_CLAUSE_MARKERS)
}

/// Priority keys first, then the first attachment in document order.
fn pick_primary_document(attachments: &Map<String, Value>) -> Option<String> {
    PRIMARY_DOCUMENT_PRIORITY
        .iter()
        .find_map(|key| attachments.get(*key))
        .or_else(|| attachments.values().next())
        .map(display_text)
}

// ────────────────────────────────────────────────────────────────────────────
// Value access helpers
// ────────────────────────────────────────────────────────────────────────────

fn section<'a>(sol: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    sol.get(key).and_then(|v| v.as_object())
}

/// Non-empty string, or a number rendered as text.
fn text_at(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A single code or a list of codes; strings and numbers both count.
fn code_set(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| text_at(Some(item)))
            .collect(),
        other => text_at(other).into_iter().collect(),
    }
}

fn first_text(candidates: &[Option<&Value>]) -> Option<String> {
    candidates.iter().find_map(|v| text_at(*v))
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|item| text_at(Some(item))).collect())
        .unwrap_or_default()
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Null) | None => false,
    }
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
