pub mod engine;
mod parse;
mod prompt;

use std::time::{SystemTime, UNIX_EPOCH};

use critique_core::{AiSettings, Evaluation, Submission};
use tracing::{debug, info};

pub use parse::{parse_evaluation, ParsedEvaluation};
pub use prompt::{system_prompt, user_message};

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("AI provider is not configured (set ai.provider, ai.model and an API key)")]
    NotConfigured,
    #[error("submission has no code")]
    EmptySubmission,
    #[error("build LLM: {0}")]
    Build(String),
    #[error("chat: {0}")]
    Chat(String),
    #[error("rate limit exceeded, try again in a few moments ({0})")]
    RateLimited(String),
    #[error("LLM returned no text")]
    EmptyResponse,
    #[error("invalid AI response format: {0}")]
    InvalidResponse(String),
}

/// Review a submission and return an unsaved [`Evaluation`] carrying `id`.
pub async fn evaluate(
    submission: &Submission,
    settings: &AiSettings,
    id: String,
) -> Result<Evaluation, EvaluateError> {
    if submission.code.trim().is_empty() {
        return Err(EvaluateError::EmptySubmission);
    }
    if !settings.is_configured() {
        return Err(EvaluateError::NotConfigured);
    }

    let system = system_prompt();
    let user_msg = user_message(submission);

    info!("evaluating {:?} with {} ({})", submission.title, settings.provider, settings.model);
    let raw = engine::generate(settings, &system, &user_msg).await?;
    debug!("raw LLM output:\n{raw}");

    let parsed = parse_evaluation(&raw)?;
    info!("{} scored {}", id, parsed.score);

    Ok(Evaluation {
        id,
        title: submission.title.clone(),
        language: submission.language.clone(),
        score: parsed.score,
        strengths: parsed.strengths,
        improvements: parsed.improvements,
        full_report: parsed.full_report,
        created_at: now_secs(),
    })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
