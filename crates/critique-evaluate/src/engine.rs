use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use tracing::debug;

use critique_core::AiSettings;

use crate::EvaluateError;

pub(crate) fn map_backend(provider: &str) -> Result<LLMBackend, EvaluateError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(EvaluateError::UnknownProvider(other.to_string())),
    }
}

/// Send one system + user exchange and return the reply text.
pub async fn generate(
    settings: &AiSettings,
    system: &str,
    user_msg: &str,
) -> Result<String, EvaluateError> {
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(&settings.model)
        .system(system)
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens);

    if let Some(key) = settings.resolved_api_key() {
        builder = builder.api_key(key);
    }

    let llm = builder
        .build()
        .map_err(|e| EvaluateError::Build(e.to_string()))?;

    let messages = vec![ChatMessage::user().content(user_msg).build()];

    debug!("chat request to {} ({})", settings.provider, settings.model);
    let response = llm.chat(&messages).await.map_err(|e| classify(e.to_string()))?;

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(EvaluateError::EmptyResponse),
    }
}

/// Providers report throttling only through the HTTP status in the message.
fn classify(message: String) -> EvaluateError {
    let lower = message.to_lowercase();
    if message.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        EvaluateError::RateLimited(message)
    } else {
        EvaluateError::Chat(message)
    }
}
