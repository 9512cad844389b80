// Prompt constants for the semantic evaluator.
// Reuses the JSON-only fragment from llm_client::prompts.

/// Persona for the semantic evaluator. Combined with `JSON_ONLY_SYSTEM` at call time.
pub const EVALUATOR_SYSTEM: &str = "You are a capture manager evaluating government bid \
    opportunities for a contracting firm. Be honest about gaps but also identify genuine strengths.";

/// Semantic evaluation prompt template.
/// Replace: {opportunity_json}, {firm_json}, {knockouts_json}, {matches_json}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Assess how well this solicitation fits the firm's capabilities.

SOLICITATION:
{opportunity_json}

FIRM CAPABILITIES:
{firm_json}

ALREADY FOUND BY ELIGIBILITY RULES (do not repeat these):
- Knockouts: {knockouts_json}
- Matches: {matches_json}

Return a JSON object with this EXACT schema:
{
  "additional_matches": [
    {"type": "category", "detail": "specific match, citing the capability and the requirement"}
  ],
  "gaps": [
    {"type": "category", "detail": "what is missing", "mitigation": "how the firm could close it"}
  ],
  "technical_summary": "3-4 sentence assessment of overall technical fit",
  "recommended_personnel": ["names of key personnel suited to this work"],
  "score_adjustment": 0
}

RULES:
1. `score_adjustment` is an integer from -20 to 20 reflecting technical fit beyond NAICS, set-aside and clearance
2. Reference actual capabilities and actual requirements. Do not invent either
3. Only name personnel who appear in the firm capabilities"#;
