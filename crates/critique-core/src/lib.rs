pub mod rubric;
pub mod settings;
pub mod store;

use serde::{Deserialize, Serialize};

pub use settings::{AiSettings, FallbackMode, OutputFormat, RenderSettings, Settings, SettingsError};
pub use store::{Store, StoreError};

// --- Report payload ---

/// The structured shape of an LLM-written report. Every field is optional:
/// the producer is not bound by a contract, so absent fields are simply not
/// rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EvaluationReport {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "codeQuality")]
    pub code_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "bestPractices")]
    pub best_practices: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readability: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "securityConsiderations",
        alias = "security"
    )]
    pub security_considerations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Recommendations>,
}

impl EvaluationReport {
    /// True when no field carries any non-whitespace content.
    pub fn is_blank(&self) -> bool {
        let narratives = [
            &self.code_quality,
            &self.best_practices,
            &self.performance,
            &self.readability,
            &self.security_considerations,
        ];
        narratives.iter().all(|field| is_blank(field.as_deref()))
            && self
                .recommendations
                .as_ref()
                .map_or(true, Recommendations::is_blank)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Recommendations {
    /// A rewritten version of the submitted function, with a short explanation
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "improvedFunction")]
    pub improved_function: Option<Recommendation>,
    /// General feedback, optionally with an illustrative snippet
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "informativeFeedback"
    )]
    pub informative_feedback: Option<Recommendation>,
}

impl Recommendations {
    pub fn is_blank(&self) -> bool {
        [&self.improved_function, &self.informative_feedback]
            .iter()
            .all(|r| r.as_ref().map_or(true, Recommendation::is_blank))
    }
}

/// Older payloads carry a recommendation as one string mixing prose and code;
/// newer ones pre-split it. Both decode into this union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum Recommendation {
    Combined(String),
    Split {
        #[serde(default)]
        explanation: String,
        #[serde(default)]
        code: String,
    },
}

impl Recommendation {
    pub fn is_blank(&self) -> bool {
        match self {
            Recommendation::Combined(text) => text.trim().is_empty(),
            Recommendation::Split { explanation, code } => {
                explanation.trim().is_empty() && code.trim().is_empty()
            }
        }
    }
}

/// `full_report` drifted between a nested object and a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum FullReport {
    Structured(EvaluationReport),
    Text(String),
}

/// What the evaluation step asks the LLM to return.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EvaluationEnvelope {
    /// Overall score between 0 and 100
    pub score: f64,
    /// Two or three sentences on what the code does well
    pub strengths: String,
    /// Two or three sentences on what to improve
    pub improvements: String,
    /// The detailed, sectioned analysis
    pub full_report: FullReport,
}

/// JSON schema of [`EvaluationEnvelope`], embedded in the evaluation prompt and
/// printed by `critique schema`.
pub fn envelope_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(EvaluationEnvelope);
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}

fn is_blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}

// --- Evaluations ---

/// A code sample submitted for review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub language: String,
    pub code: String,
}

/// A stored evaluation. `full_report` is kept as the raw payload string so the
/// formatter sees exactly what the producer wrote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub language: String,
    pub score: u8,
    pub strengths: String,
    pub improvements: String,
    pub full_report: String,
    #[serde(default)]
    pub created_at: u64,
}

/// Clamp an LLM-reported score into 0..=100. NaN counts as 0.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}
