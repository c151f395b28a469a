//! Ollama LLM Provider
//!
//! `LlmProvider` backed by a local Ollama server.

use async_trait::async_trait;
use ollama_rs::{
    generation::{
        chat::{request::ChatMessageRequest, ChatMessage, ChatMessageResponse, MessageRole},
    },
    models::ModelOptions as OllamaOptions,
    Ollama,
};
use orchestrator_core::{
    error::{OrchestratorError, Result},
    message::{Message, Role},
    provider::{Completion, GenerationOptions, LlmProvider, TokenUsage},
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Model used when the agent tree does not name one
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_HOST`, `OLLAMA_PORT` and `OLLAMA_MODEL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("OLLAMA_HOST").unwrap_or(defaults.host),
            port: var("OLLAMA_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            model: var("OLLAMA_MODEL").unwrap_or(defaults.model),
        }
    }

    /// Generation defaults for this server's model
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            ..GenerationOptions::default()
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Map orchestrator messages onto Ollama chat messages
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Model => MessageRole::Assistant,
                    // Tool output is context the model reads, as if the user pasted it
                    Role::Tool => MessageRole::User,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    fn convert_completion(response: ChatMessageResponse, model: &str) -> Completion {
        Completion {
            content: response.message.content,
            model: model.to_string(),
            usage: response.final_data.as_ref().map(|d| {
                let prompt = u32::try_from(d.prompt_eval_count).unwrap_or(u32::MAX);
                let completion = u32::try_from(d.eval_count).unwrap_or(u32::MAX);
                TokenUsage {
                    prompt_tokens: prompt,
                    completion_tokens: completion,
                    total_tokens: prompt.saturating_add(completion),
                }
            }),
        }
    }

    fn build_options(opts: &GenerationOptions) -> OllamaOptions {
        OllamaOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(error = %e, "Ollama health check failed");
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let model = if options.model.trim().is_empty() {
            self.config.model.as_str()
        } else {
            options.model.as_str()
        };
        let request = ChatMessageRequest::new(model.to_string(), Self::convert_messages(messages))
            .options(Self::build_options(options));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| OrchestratorError::Provider(e.to_string()))?;

        Ok(Self::convert_completion(response, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.model, "llama3.2");
    }

    #[test]
    fn test_model_from_environment_reaches_generation_options() {
        let config = OllamaConfig::from_lookup(|key| match key {
            "OLLAMA_MODEL" => Some("gemma3".into()),
            "OLLAMA_PORT" => Some("not-a-port".into()),
            _ => None,
        });

        assert_eq!(config.model, "gemma3");
        assert_eq!(config.port, 11434);
        assert_eq!(config.generation_options().model, "gemma3");
        assert_eq!(
            config.generation_options().temperature,
            GenerationOptions::default().temperature
        );
    }

    #[test]
    fn test_blank_model_keeps_default() {
        let config = OllamaConfig::from_lookup(|key| (key == "OLLAMA_MODEL").then(|| " ".to_string()));
        assert_eq!(config.model, "llama3.2");
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are the orchestration agent."),
            Message::user("What are today's classes?"),
            Message::model("```tool\n{\"tool\": \"get_today_events\"}\n```"),
            Message::tool("[Tool 'get_today_events' returned]\nMaths 09:00"),
        ];

        let converted = OllamaProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 4);
        assert_eq!(converted[3].content, "[Tool 'get_today_events' returned]\nMaths 09:00");
    }
}
