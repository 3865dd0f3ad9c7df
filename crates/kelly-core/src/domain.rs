/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Backend conversation identifier, derived from the caller's user id.
///
/// Invariant: stable across calls and injective across distinct users, so the
/// backend keeps one conversation per Telegram user.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn for_user(user_id: UserId) -> Self {
        Self(format!("tg_user_{}", user_id.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One retrieval source, in the backend's ranking order.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceEntry {
    pub source_id: String,
    pub score: Option<f64>,
}

/// Normalized backend answer. Produced fresh per call; never cached.
///
/// On any backend failure the adapter substitutes a user-safe fallback answer
/// with an empty source list, so this struct is always well-formed.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceEntry>,
    pub session_key: String,
}

impl ChatResponse {
    /// Fallback result carrying only a user-safe answer.
    pub fn fallback(answer: impl Into<String>, session_key: &SessionKey) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            session_key: session_key.0.clone(),
        }
    }
}

/// Identity + debug entitlements of the user whose message is being handled.
#[derive(Clone, Copy, Debug)]
pub struct CallerContext {
    pub user_id: UserId,
    /// Membership in the statically configured debug-user set.
    pub authorized_for_debug: bool,
    /// Per-user opt-in toggle, read from the state store.
    pub debug_enabled: bool,
}

/// Final outbound reply for one inbound message.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedReply {
    pub text: String,
    /// When true the text is MarkdownV2 and must be sent with that parse mode.
    pub rich: bool,
}
