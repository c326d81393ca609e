use anyhow::{bail, Context, Result};
use std::env;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,

    // Assessment service
    pub api_url: String,
    pub api_timeout_seconds: u64,

    // Image pipeline
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::parse(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));

        // Assessment service
        let api_url = env::var("SIGNCHECK_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let api_url = validate_api_url(&api_url)?;
        let api_timeout_seconds = env::var("SIGNCHECK_API_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // LLM-backed assessment is slow

        // Image pipeline
        let max_image_dimension = env::var("SIGNCHECK_MAX_IMAGE_DIMENSION")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(crate::photo::MAX_DIMENSION);
        let jpeg_quality = env::var("SIGNCHECK_JPEG_QUALITY")
            .ok()
            .and_then(|s| s.parse::<u8>().ok())
            .map(|q| q.clamp(1, 100))
            .unwrap_or(crate::photo::JPEG_QUALITY);

        Ok(Settings {
            env,
            api_url,
            api_timeout_seconds,
            max_image_dimension,
            jpeg_quality,
        })
    }

    /// Replace the service URL, e.g. from a command-line flag.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        self.api_url = validate_api_url(api_url)?;
        Ok(self)
    }
}

fn validate_api_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).with_context(|| format!("invalid service URL: {raw}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("service URL must be http or https: {raw}");
    }
    Ok(raw.trim_end_matches('/').to_string())
}
