//! Telegram update handlers.
//!
//! Commands are routed separately from plain text; anything without text is
//! ignored. Handlers never bubble a backend fault to the dispatcher — the user
//! always receives some reply text.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;
mod text;

#[cfg(test)]
pub(crate) mod testutil;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(body) = msg.text() else {
        tracing::debug!("ignoring update without message text");
        return Ok(());
    };

    if body.starts_with('/') {
        return commands::handle_command(msg, state).await;
    }

    text::handle_text(msg, state).await
}
