//! Chat orchestration: context lookup, prompt assembly, language-model completion.
//!
//! The orchestrator never answers without context. If the index is down or the query
//! failed, the request fails rather than degrading to a context-free reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::context::ContextLookup;
use crate::providers::{LanguageModel, ProviderError};

pub const COACH_ROLE_INSTRUCTION: &str = "Tu es un coach personnel bienveillant et exigeant. \
Aide l'utilisateur à clarifier ses objectifs, à construire de bonnes habitudes et à passer à \
l'action. Réponds en français, de façon concrète et structurée.";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

impl ChatRequest {
    /// Both fields must be non-empty. Whitespace counts as text.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.user_id.is_empty() {
            return Err(ChatError::InvalidRequest("user_id must not be empty"));
        }
        if self.message.is_empty() {
            return Err(ChatError::InvalidRequest("message must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidRequest(&'static str),
    #[error("language model is not available")]
    ModelUnavailable,
    #[error("knowledge context is not available")]
    ContextUnavailable,
    #[error("response generation failed")]
    Generation(#[source] ProviderError),
}

/// Single prompt: role instruction, serialized context, then the raw user message.
pub fn build_prompt(context: &Value, message: &str) -> String {
    format!(
        "{}\n\nContexte :\n{}\n\nQuestion de l'utilisateur : {}",
        COACH_ROLE_INSTRUCTION, context, message
    )
}

pub struct ChatOrchestrator {
    context: Arc<ContextLookup>,
    model: Option<Arc<dyn LanguageModel>>,
}

impl ChatOrchestrator {
    pub fn new(context: Arc<ContextLookup>, model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { context, model }
    }

    /// `user_id` is accepted for logging only; no per-user history is kept.
    pub async fn chat(&self, user_id: &str, message: &str) -> Result<ChatResponse, ChatError> {
        let Some(model) = self.model.as_ref() else {
            tracing::error!(target: "pagi::coach::chat", "Language model not initialized");
            return Err(ChatError::ModelUnavailable);
        };

        let Some(context) = self.context.query(message).await else {
            tracing::error!(target: "pagi::coach::chat", user_id = %user_id, "Chat refused: no knowledge context");
            return Err(ChatError::ContextUnavailable);
        };

        let prompt = build_prompt(&context, message);
        match model.complete(&prompt).await {
            Ok(response) => {
                tracing::info!(
                    target: "pagi::coach::chat",
                    user_id = %user_id,
                    response_len = response.len(),
                    "Chat response generated"
                );
                Ok(ChatResponse { response })
            }
            Err(e) => {
                tracing::error!(target: "pagi::coach::chat", user_id = %user_id, error = %e, "Language model call failed");
                Err(ChatError::Generation(e))
            }
        }
    }
}
