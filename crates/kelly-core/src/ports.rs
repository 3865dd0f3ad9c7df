use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatResponse, MessageRef, SessionKey},
    Result,
};

/// Port for the question-answering backend.
///
/// Infallible by contract: every failure mode is absorbed by the adapter and
/// mapped to a fallback [`ChatResponse`] carrying a user-safe answer and the
/// caller's session key. Nothing throws across this boundary.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, message: &str, session: &SessionKey) -> ChatResponse;
}

/// Port for the outbound send primitive.
///
/// Telegram is the first implementation; the shape is kept small so future
/// adapters can fit behind the same interface.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send plain text (no parse mode).
    async fn send_plain(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Send MarkdownV2 text. Callers are responsible for escaping.
    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
}
