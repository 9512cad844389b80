// Literal term lists behind every keyword heuristic in the pipeline.
// Matching against these is case-insensitive unless noted otherwise.

/// Id used when a record carries neither `solicitation_number` nor `id`.
pub const UNKNOWN_ID: &str = "Unknown";

/// Requirement label for contractor responsibilities pulled from the scope of work.
pub const SCOPE_OF_WORK_LABEL: &str = "API - Scope of Work";

/// Compliance text containing any of these is a clearance requirement.
pub const CLEARANCE_TERMS: &[&str] = &["clearance", "secret"];

/// Compliance text containing any of these is a certification requirement.
pub const CERTIFICATION_TERMS: &[&str] = &["certified", "license"];

/// Clause text containing any of these (case-insensitive) is an evaluation criterion.
/// "215" is the FAR part covering evaluation factors.
pub const EVALUATION_CLAUSE_MARKERS: &[&str] = &["215", "evaluation"];

/// Attachment keys checked in order when picking the primary document.
pub const PRIMARY_DOCUMENT_PRIORITY: &[&str] = &[
    "performance_work_statement",
    "statement_of_work",
    "main_solicitation",
];

pub const FULL_AND_OPEN: &str = "Full and Open";
pub const SMALL_BUSINESS_SET_ASIDE: &str = "Small Business Set-Aside";

/// Set-aside categories that impose no restriction. Exact match.
pub const UNRESTRICTED_CATEGORIES: &[&str] = &[FULL_AND_OPEN, "Unrestricted"];

/// Canonical set-aside tag → accepted literal variants. Exact or substring match, case-sensitive.
pub const SET_ASIDE_ALIASES: &[(&str, &[&str])] = &[
    ("WOSB", &["Woman Owned Small Business (WOSB)", "WOSB"]),
    ("SDB", &["Small Disadvantaged Business (SDB)", "SDB"]),
    ("8(a)", &["8(a)"]),
    ("Minority", &["Minority Owned Business", "Minority Owned"]),
    (
        "Small Business",
        &[
            "Small Business",
            "Small Business Set-Aside",
            "Competitive Small Business Set Aside",
        ],
    ),
];

/// Set-asides that knock a firm out when unrecognised and unmatched. Compared upper-cased.
pub const HIGH_RESTRICTION_MARKERS: &[&str] = &["SDVOSB", "HUBZONE", "8(A)"];

/// A required clearance containing this term needs a cleared firm.
pub const SECRET_TERM: &str = "secret";

/// Firm clearance levels containing any of these satisfy a secret requirement.
pub const FIRM_SECRET_LEVELS: &[&str] = &["secret", "top secret"];

/// Requirements forwarded to the semantic evaluator.
pub const MAX_EVALUATOR_REQUIREMENTS: usize = 30;

/// True when `haystack` contains any of `terms`, ignoring case.
pub fn contains_any_ignore_case(haystack: &str, terms: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    terms
        .iter()
        .any(|term| haystack.contains(&term.to_lowercase()))
}
