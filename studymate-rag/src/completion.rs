//! Completion provider trait for single-shot chat completions.

use async_trait::async_trait;

use crate::error::Result;

/// A single chat-completion request.
///
/// The engine only ever issues one-shot requests: an optional system
/// instruction plus one user message, with bounded output and an explicit
/// temperature. No tool calls, no streaming.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system instruction prepended to the conversation.
    pub system: Option<String>,
    /// The user message.
    pub user: String,
    /// Sampling temperature. Grounded answers use low values.
    pub temperature: f32,
    /// Maximum output tokens, when the backend supports a cap.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Build a request with just a user message and default sampling.
    pub fn user(message: impl Into<String>) -> Self {
        Self { system: None, user: message.into(), temperature: 0.7, max_tokens: None }
    }

    /// Set the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the output length in tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A provider that turns a [`CompletionRequest`] into generated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Execute one completion request and return the model's text output.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
