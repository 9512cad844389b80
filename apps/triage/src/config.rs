use std::path::PathBuf;

use anyhow::{Context, Result};

/// Partner endpoint used when `QUORUM_API_URL` is not set.
const DEFAULT_API_URL: &str = "https://rca4xjkfei6v6dph5sfetpnv3u0nnbak.lambda-url.us-east-1.on.aws/";
const DEFAULT_FIRM_PROFILE_PATH: &str = "Input/My Firm/Firm Data.json";
const DEFAULT_OUTPUT_DIR: &str = "output_reports";

/// Run configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub api_url: String,
    pub firm_profile_path: PathBuf,
    pub output_dir: PathBuf,
    pub source_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            api_url: optional_env("QUORUM_API_URL", DEFAULT_API_URL),
            firm_profile_path: PathBuf::from(optional_env(
                "FIRM_PROFILE_PATH",
                DEFAULT_FIRM_PROFILE_PATH,
            )),
            output_dir: PathBuf::from(optional_env("OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            source_timeout_secs: optional_env("SOURCE_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .context("SOURCE_TIMEOUT_SECS must be a whole number of seconds")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
