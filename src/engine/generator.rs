use futures::future;
use futures::stream::{BoxStream, StreamExt};
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::{CompletionError, Prompt};
use rig::providers::openai;
use rig::streaming::{StreamedAssistantContent, StreamingPrompt};

use super::context::PromptParts;
use super::{EngineError, GenerationConfig};

type ChatModel = <openai::Client as CompletionClient>::CompletionModel;

/// Wrapper around the LLM client (any OpenAI-compatible endpoint)
pub struct LlmClient {
    client: openai::Client,
    model: String,
    config: GenerationConfig,
}

impl LlmClient {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        model: impl Into<String>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            client: openai::Client::from_url(api_key, endpoint.trim_end_matches('/')),
            model: model.into(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One agent per question: the context document differs every time.
    fn agent(&self, parts: &PromptParts) -> Agent<ChatModel> {
        self.client
            .agent(&self.model)
            .preamble(parts.preamble)
            .context(&parts.context)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
    }

    /// Generate the full answer in one response
    pub async fn complete(&self, parts: &PromptParts) -> Result<String, EngineError> {
        let answer = self
            .agent(parts)
            .prompt(parts.prompt.as_str())
            .await
            .map_err(|e| EngineError::Generation(e.to_string()))?;

        if answer.trim().is_empty() {
            return Err(EngineError::EmptyCompletion);
        }
        Ok(answer)
    }

    /// Generate the answer as text chunks in the order the model emits them
    pub async fn stream(
        &self,
        parts: &PromptParts,
    ) -> Result<BoxStream<'static, Result<String, EngineError>>, EngineError> {
        let response = self
            .agent(parts)
            .stream_prompt(parts.prompt.as_str())
            .await
            .map_err(|e| EngineError::Generation(e.to_string()))?;

        Ok(response
            .filter_map(|item| future::ready(delta_text(item)))
            .boxed())
    }
}

/// Text carried by one streamed item; tool calls and the final usage
/// summary carry none.
fn delta_text<R>(
    item: Result<StreamedAssistantContent<R>, CompletionError>,
) -> Option<Result<String, EngineError>> {
    match item {
        Ok(StreamedAssistantContent::Text(text)) if !text.text.is_empty() => Some(Ok(text.text)),
        Ok(_) => None,
        Err(e) => Some(Err(EngineError::Generation(e.to_string()))),
    }
}
