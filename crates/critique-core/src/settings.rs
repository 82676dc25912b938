use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Everything persisted in `settings.json`. Missing sections fall back to
/// their defaults so an older file keeps loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub render: RenderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl AiSettings {
    /// The configured key, or `<PROVIDER>_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        let var = format!("{}_API_KEY", self.provider.to_uppercase());
        std::env::var(var).ok().filter(|k| !k.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        !self.provider.is_empty()
            && !self.model.is_empty()
            && (self.provider == "ollama" || self.resolved_api_key().is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Language tag for snippets that carry no label of their own
    pub default_language: String,
    /// Keyword that anchors unfenced code detection
    pub function_keyword: String,
    pub fallback: FallbackMode,
    pub format: OutputFormat,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            default_language: "javascript".to_string(),
            function_keyword: "function".to_string(),
            fallback: FallbackMode::Raw,
            format: OutputFormat::Text,
        }
    }
}

/// How a payload that does not decode is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// The payload verbatim, as a preformatted block
    #[default]
    Raw,
    /// A parse-error notice above the payload
    Notice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Html,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(FallbackMode::Raw),
            "notice" => Ok(FallbackMode::Notice),
            other => Err(format!("unknown fallback mode: {other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown setting: {0}")]
    UnknownKey(String),
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Keys accepted by [`Settings::set`], in display order.
pub const KEYS: &[&str] = &[
    "ai.provider",
    "ai.model",
    "ai.apiKey",
    "ai.temperature",
    "ai.maxTokens",
    "render.defaultLanguage",
    "render.functionKeyword",
    "render.fallback",
    "render.format",
];

impl Settings {
    /// Update one dotted key, e.g. `render.fallback`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = |reason: String| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };
        match key {
            "ai.provider" => self.ai.provider = value.to_lowercase(),
            "ai.model" => self.ai.model = value.to_string(),
            "ai.apiKey" => self.ai.api_key = value.to_string(),
            "ai.temperature" => {
                let t: f32 = value.parse().map_err(|e| invalid(format!("{e}")))?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(invalid("expected a number between 0 and 2".to_string()));
                }
                self.ai.temperature = t;
            }
            "ai.maxTokens" => {
                self.ai.max_tokens = value.parse().map_err(|e| invalid(format!("{e}")))?;
            }
            "render.defaultLanguage" => {
                if value.trim().is_empty() {
                    return Err(invalid("must not be empty".to_string()));
                }
                self.render.default_language = value.trim().to_string();
            }
            "render.functionKeyword" => {
                if !is_keyword(value) {
                    return Err(invalid("expected a single identifier".to_string()));
                }
                self.render.function_keyword = value.to_string();
            }
            "render.fallback" => self.render.fallback = value.parse().map_err(invalid)?,
            "render.format" => self.render.format = value.parse().map_err(invalid)?,
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Read one dotted key. API keys are masked.
    pub fn get(&self, key: &str) -> Result<String, SettingsError> {
        Ok(match key {
            "ai.provider" => self.ai.provider.clone(),
            "ai.model" => self.ai.model.clone(),
            "ai.apiKey" => mask(&self.ai.api_key),
            "ai.temperature" => self.ai.temperature.to_string(),
            "ai.maxTokens" => self.ai.max_tokens.to_string(),
            "render.defaultLanguage" => self.render.default_language.clone(),
            "render.functionKeyword" => self.render.function_keyword.clone(),
            "render.fallback" => match self.render.fallback {
                FallbackMode::Raw => "raw".to_string(),
                FallbackMode::Notice => "notice".to_string(),
            },
            "render.format" => self.render.format.to_string(),
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        })
    }
}

fn is_keyword(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn mask(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}
