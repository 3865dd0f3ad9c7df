use std::sync::Arc;

use teloxide::prelude::*;

use kelly_core::{
    domain::{CallerContext, ChatId, SessionKey, UserId},
    reply,
};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        tracing::warn!("text message without sender info, ignoring");
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }

    let chat_id = ChatId(msg.chat.id.0);
    let user_id = UserId(user.id.0 as i64);

    relay_message(&state, chat_id, user_id, text).await;
    Ok(())
}

/// The relay pipeline for one inbound message: derive the session key, call
/// the backend, assemble the reply for this caller, send it in the rendered
/// mode. Backend faults are already absorbed into the response, so the user
/// always gets text.
pub(crate) async fn relay_message(state: &AppState, chat_id: ChatId, user_id: UserId, text: &str) {
    let session = SessionKey::for_user(user_id);
    tracing::info!(user = user_id.0, session = session.as_str(), "relaying message");

    let response = state.backend.chat(text, &session).await;

    let caller = CallerContext {
        user_id,
        authorized_for_debug: state.cfg.authorized_debug_users.contains(&user_id.0),
        debug_enabled: state.store.debug_mode(user_id).await,
    };

    let rendered = reply::render(&response, &caller);

    let sent = if rendered.rich {
        state.messenger.send_markdown(chat_id, &rendered.text).await
    } else {
        state.messenger.send_plain(chat_id, &rendered.text).await
    };

    if let Err(e) = sent {
        tracing::error!(user = user_id.0, "failed to send reply: {e}");
    }
}
