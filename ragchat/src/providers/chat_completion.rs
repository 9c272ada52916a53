//! OpenAI-style chat completion wire format, shared by Azure and local servers

use serde::{Deserialize, Serialize};

use super::ProviderResult;
use crate::error::ProviderError;
use ragchat_cache::ChatMessage;

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, trimmed; empty text is an invalid response
    pub fn into_reply(self) -> ProviderResult<String> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in completion".into()))?;

        let reply = content.trim();
        if reply.is_empty() {
            return Err(ProviderError::InvalidResponse("empty completion".into()));
        }
        Ok(reply.to_string())
    }
}
