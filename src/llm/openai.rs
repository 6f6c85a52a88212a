//! OpenAI chat completions implementation.

use super::{ChatTurn, LanguageModel, Role};
use crate::error::{CineragError, Result};
use async_openai::config::{Config, OpenAIConfig};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model backed by the OpenAI (or Azure OpenAI) chat completions endpoint.
pub struct OpenAIChatModel<C: Config = OpenAIConfig> {
    client: Client<C>,
    model: String,
    temperature: Option<f32>,
}

impl<C: Config> OpenAIChatModel<C> {
    pub fn new(client: Client<C>, model: &str, temperature: Option<f32>) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

fn to_request_message(turn: &ChatTurn) -> Result<ChatCompletionRequestMessage> {
    let build_err = |e: async_openai::error::OpenAIError| CineragError::Generation(e.to_string());
    let content = turn.content.clone();

    Ok(match turn.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_err)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_err)?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_err)?
            .into(),
    })
}

#[async_trait]
impl<C> LanguageModel for OpenAIChatModel<C>
where
    C: Config + Send + Sync + 'static,
{
    #[instrument(skip(self, turns), fields(model = %self.model, turns = turns.len()))]
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String> {
        let messages = turns
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let request = args
            .build()
            .map_err(|e| CineragError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            CineragError::Generation(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| CineragError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_convert_to_messages() {
        let system = to_request_message(&ChatTurn::system("rules")).unwrap();
        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));

        let user = to_request_message(&ChatTurn::user("question")).unwrap();
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));

        let assistant = to_request_message(&ChatTurn::assistant("answer")).unwrap();
        assert!(matches!(assistant, ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_model_name() {
        let client = crate::openai::create_client().unwrap();
        let llm = OpenAIChatModel::new(client, "gpt-4o-mini", Some(0.2));
        assert_eq!(llm.model(), "gpt-4o-mini");
    }
}
