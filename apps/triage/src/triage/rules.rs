//! Rule Evaluator: deterministic eligibility checks against the firm profile.
//!
//! Three independent, cumulative checks: classification codes, set-aside
//! eligibility and clearance. Pure and total.

use std::collections::BTreeSet;

use crate::models::firm::FirmProfile;
use crate::models::opportunity::AggregatedOpportunity;
use crate::models::report::Finding;
use crate::triage::keywords::{
    contains_any_ignore_case, FIRM_SECRET_LEVELS, HIGH_RESTRICTION_MARKERS, SECRET_TERM,
    SET_ASIDE_ALIASES, UNRESTRICTED_CATEGORIES,
};

/// Output of the rule stage, consumed by the fit scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub knockouts: Vec<Finding>,
    pub matches: Vec<Finding>,
    pub naics_match: bool,
    pub set_aside_eligible: bool,
}

pub fn evaluate_rules(opportunity: &AggregatedOpportunity, firm: &FirmProfile) -> RuleOutcome {
    let mut knockouts = Vec::new();
    let mut matches = Vec::new();

    let naics_match = check_classification_codes(opportunity, firm, &mut knockouts, &mut matches);
    let set_aside_eligible = check_set_asides(opportunity, firm, &mut knockouts, &mut matches);
    check_clearances(opportunity, firm, &mut knockouts);

    RuleOutcome {
        knockouts,
        matches,
        naics_match,
        set_aside_eligible,
    }
}

/// An opportunity that declares no codes imposes no constraint.
fn check_classification_codes(
    opportunity: &AggregatedOpportunity,
    firm: &FirmProfile,
    knockouts: &mut Vec<Finding>,
    matches: &mut Vec<Finding>,
) -> bool {
    let required = &opportunity.classification_codes;
    if required.is_empty() {
        return true;
    }

    let overlap: BTreeSet<&String> = firm.naics_codes().intersection(required).collect();
    if overlap.is_empty() {
        knockouts.push(Finding::knockout(
            "NAICS Mismatch",
            format!(
                "RFP requires NAICS {}. Firm has {}.",
                join(required.iter()),
                join(firm.naics_codes().iter())
            ),
        ));
        return false;
    }

    matches.push(Finding::matched(
        "NAICS Match",
        format!("Firm NAICS codes match: {}", join(overlap.into_iter())),
    ));
    true
}

/// Categories that no alias recognises and that carry no high-restriction
/// marker are ignored: they produce neither a match nor a knockout.
fn check_set_asides(
    opportunity: &AggregatedOpportunity,
    firm: &FirmProfile,
    knockouts: &mut Vec<Finding>,
    matches: &mut Vec<Finding>,
) -> bool {
    let business_types = firm.business_types();
    let firm_has_marker = business_types
        .iter()
        .any(|bt| has_high_restriction_marker(bt));
    let mut eligible = true;

    for category in &opportunity.set_aside_categories {
        if category.is_empty() || UNRESTRICTED_CATEGORIES.contains(&category.as_str()) {
            continue;
        }

        let satisfied = SET_ASIDE_ALIASES.iter().any(|(_, variants)| {
            classifies_as(category, variants)
                && business_types.iter().any(|bt| classifies_as(bt, variants))
        });

        if satisfied {
            matches.push(Finding::matched(
                "Set-Aside Eligible",
                format!("Firm qualifies for {category} set-aside"),
            ));
        } else if has_high_restriction_marker(category) && !firm_has_marker {
            knockouts.push(Finding::knockout(
                "Set-Aside Ineligible",
                format!("RFP requires {category} set-aside. Firm does not qualify."),
            ));
            eligible = false;
        }
    }

    eligible
}

fn check_clearances(
    opportunity: &AggregatedOpportunity,
    firm: &FirmProfile,
    knockouts: &mut Vec<Finding>,
) {
    let firm_level = firm.clearance_level();
    let firm_is_cleared = contains_any_ignore_case(firm_level, FIRM_SECRET_LEVELS);

    for clearance in &opportunity.clearances_required {
        if contains_any_ignore_case(clearance, &[SECRET_TERM]) && !firm_is_cleared {
            knockouts.push(Finding::knockout(
                "Clearance Gap",
                format!("RFP requires {clearance}. Firm clearance: {firm_level}"),
            ));
        }
    }
}

/// Exact or substring match against an alias variant list (case-sensitive).
fn classifies_as(text: &str, variants: &[&str]) -> bool {
    variants.iter().any(|v| text == *v || text.contains(v))
}

fn has_high_restriction_marker(text: &str) -> bool {
    let upper = text.to_uppercase();
    HIGH_RESTRICTION_MARKERS.iter().any(|m| upper.contains(m))
}

fn join<'a>(codes: impl Iterator<Item = &'a String>) -> String {
    codes.map(String::as_str).collect::<Vec<_>>().join(", ")
}
