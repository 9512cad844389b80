use std::collections::BTreeSet;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::TriageError;

fn default_clearance_level() -> String {
    "None".to_string()
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}

/// Strings and numbers, alone or in a list, rendered as text. Other shapes are skipped.
fn scalar_texts(raw: Option<Value>) -> Vec<String> {
    let items = match raw {
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn lenient_code_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_texts(Option::<Value>::deserialize(deserializer)?)
        .into_iter()
        .collect())
}

fn lenient_texts<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_texts(Option::<Value>::deserialize(deserializer)?))
}

fn lenient_clearance<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_texts(Option::<Value>::deserialize(deserializer)?)
        .into_iter()
        .next()
        .unwrap_or_else(default_clearance_level))
}

/// A list whose unreadable entries are dropped; a lone object counts as a one-entry list.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

fn lenient_section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// Eligibility facts about the firm. These are the only fields the rule checks read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmMetadata {
    #[serde(default, deserialize_with = "lenient_code_set")]
    pub naics_codes: BTreeSet<String>,
    #[serde(default, rename = "business_type", deserialize_with = "lenient_texts")]
    pub business_types: Vec<String>,
    #[serde(
        default = "default_clearance_level",
        deserialize_with = "lenient_clearance"
    )]
    pub clearance_level: String,
}

impl Default for FirmMetadata {
    fn default() -> Self {
        Self {
            naics_codes: BTreeSet::new(),
            business_types: Vec::new(),
            clearance_level: default_clearance_level(),
        }
    }
}

/// Free-form capability text, forwarded to the semantic evaluator as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "empty_list")]
    pub core_competencies: Value,
    #[serde(default = "empty_list")]
    pub specialized_expertise: Value,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            core_competencies: empty_list(),
            specialized_expertise: empty_list(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastPerformance {
    #[serde(default = "empty_list")]
    pub relevance_points: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPersonnel {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub expertise: Value,
}

/// The firm capability profile. Read-only for the whole run.
///
/// Only an unreadable file or invalid JSON is rejected. Sections of the wrong
/// shape degrade to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmProfile {
    #[serde(default, deserialize_with = "lenient_section")]
    pub firm_metadata: FirmMetadata,
    #[serde(default, deserialize_with = "lenient_section")]
    pub capabilities: Capabilities,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub past_performance: Vec<PastPerformance>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub key_personnel: Vec<KeyPersonnel>,
}

impl FirmProfile {
    pub fn naics_codes(&self) -> &BTreeSet<String> {
        &self.firm_metadata.naics_codes
    }

    pub fn business_types(&self) -> &[String] {
        &self.firm_metadata.business_types
    }

    pub fn clearance_level(&self) -> &str {
        &self.firm_metadata.clearance_level
    }

    /// Loads the profile from a JSON file. Any failure here is fatal for the run.
    pub async fn load(path: &Path) -> Result<Self, TriageError> {
        let fatal = |reason: String| TriageError::FirmProfile {
            path: path.to_path_buf(),
            reason,
        };
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| fatal(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| fatal(format!("invalid JSON: {e}")))
    }
}
