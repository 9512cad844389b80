// Triage pipeline: normalizer → rule evaluator → fit scorer, once per record.
// All LLM calls go through llm_client via the SemanticEvaluator seam.

pub mod evaluator;
pub mod fit_scoring;
pub mod keywords;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod rules;
