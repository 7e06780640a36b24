use anyhow::{anyhow, Context, Result};

use crate::media::SignatureAlgorithm;

const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub clipdrop_api_key: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    pub cloudinary_signature_algorithm: SignatureAlgorithm,
    pub clerk_secret_key: String,
    pub clerk_api_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: optional_env("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: optional_env("LLM_MODEL", DEFAULT_LLM_MODEL),
            clipdrop_api_key: require_env("CLIPDROP_API_KEY")?,
            cloudinary_cloud_name: require_env("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_api_key: require_env("CLOUDINARY_API_KEY")?,
            cloudinary_api_secret: require_env("CLOUDINARY_API_SECRET")?,
            cloudinary_signature_algorithm: parse_signature_algorithm(
                std::env::var("CLOUDINARY_SIGNATURE_ALGORITHM").ok().as_deref(),
            )?,
            clerk_secret_key: require_env("CLERK_SECRET_KEY")?,
            clerk_api_url: optional_env("CLERK_API_URL", DEFAULT_CLERK_API_URL),
            port: parse_port(std::env::var("PORT").ok().as_deref())?,
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

fn parse_port(raw: Option<&str>) -> Result<u16> {
    raw.unwrap_or("8080")
        .parse::<u16>()
        .context("PORT must be a valid port number")
}

fn parse_signature_algorithm(raw: Option<&str>) -> Result<SignatureAlgorithm> {
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(SignatureAlgorithm::default()),
        Some(v) => v
            .parse()
            .map_err(|e| anyhow!("CLOUDINARY_SIGNATURE_ALGORITHM: {e}")),
    }
}
