use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "HIGH")]
    High,
}

/// Unknown severities (the evaluator may invent its own scale) are dropped rather than rejected.
fn lenient_severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .filter(|s| s.eq_ignore_ascii_case("high"))
        .map(|_| Severity::High))
}

/// A knockout, match or gap. Order in a list is display order only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type", alias = "category", default)]
    pub category: String,
    #[serde(alias = "reason", alias = "description", default)]
    pub detail: String,
    #[serde(
        default,
        deserialize_with = "lenient_severity",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

impl Finding {
    pub fn knockout(category: &str, reason: String) -> Self {
        Self {
            category: category.to_string(),
            detail: reason,
            severity: Some(Severity::High),
            mitigation: None,
        }
    }

    pub fn matched(category: &str, detail: String) -> Self {
        Self {
            category: category.to_string(),
            detail,
            severity: None,
            mitigation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "CONDITIONAL")]
    Conditional,
    #[serde(rename = "NO-GO")]
    NoGo,
    /// Only carried by placeholder reports for solicitations that failed to score.
    #[serde(rename = "ERROR")]
    Error,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Go => "GO",
            Recommendation::Conditional => "CONDITIONAL",
            Recommendation::NoGo => "NO-GO",
            Recommendation::Error => "ERROR",
        }
    }
}

/// Terminal artifact for one solicitation. Immutable once built; persisted keyed by `rfp_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub rfp_id: String,
    pub rfp_title: Option<String>,
    pub agency: Option<String>,
    /// 0 – 100
    pub match_score: u8,
    pub recommendation: Recommendation,
    pub knockouts: Vec<Finding>,
    pub strong_matches: Vec<Finding>,
    pub gaps: Vec<Finding>,
    pub naics_match: bool,
    pub set_aside_eligible: bool,
    pub technical_summary: String,
    pub recommended_personnel: Vec<String>,
    pub documents_analyzed: Vec<String>,
    /// RFC 3339, set when the report is built.
    pub analysis_timestamp: String,
    pub solicitation_number: Option<String>,
    pub deadline: Option<String>,
    pub original_url: Option<String>,
    pub posted_date: Option<String>,
}

/// Placeholder written when scoring a solicitation raised an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedReport {
    pub rfp_id: String,
    pub match_score: u8,
    pub recommendation: Recommendation,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
}

impl FailedReport {
    pub fn new(rfp_id: String, agency: Option<String>, error: String) -> Self {
        Self {
            rfp_id,
            match_score: 0,
            recommendation: Recommendation::Error,
            error,
            agency,
        }
    }
}

/// What the batch runner persists per solicitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportRecord {
    Scored(TriageReport),
    Failed(FailedReport),
}

impl ReportRecord {
    pub fn rfp_id(&self) -> &str {
        match self {
            ReportRecord::Scored(r) => &r.rfp_id,
            ReportRecord::Failed(r) => &r.rfp_id,
        }
    }

    pub fn match_score(&self) -> u8 {
        match self {
            ReportRecord::Scored(r) => r.match_score,
            ReportRecord::Failed(r) => r.match_score,
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            ReportRecord::Scored(r) => r.recommendation,
            ReportRecord::Failed(r) => r.recommendation,
        }
    }

    pub fn knockout_count(&self) -> usize {
        match self {
            ReportRecord::Scored(r) => r.knockouts.len(),
            ReportRecord::Failed(_) => 0,
        }
    }

    pub fn agency(&self) -> Option<&str> {
        match self {
            ReportRecord::Scored(r) => r.agency.as_deref(),
            ReportRecord::Failed(r) => r.agency.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub rfp_id: String,
    pub score: u8,
    pub recommendation: Recommendation,
    pub knockout_count: usize,
    pub agency: Option<String>,
}

impl From<&ReportRecord> for SummaryEntry {
    fn from(record: &ReportRecord) -> Self {
        Self {
            rfp_id: record.rfp_id().to_string(),
            score: record.match_score(),
            recommendation: record.recommendation(),
            knockout_count: record.knockout_count(),
            agency: record.agency().map(str::to_string),
        }
    }
}

/// One record per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed_at: String,
    pub source: String,
    pub total: usize,
    pub results: Vec<SummaryEntry>,
}
