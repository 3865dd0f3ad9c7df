use std::sync::Arc;

use teloxide::prelude::*;

use kelly_core::domain::{ChatId, UserId};

use crate::router::AppState;

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let (cmd, args) = parse_command(msg.text().unwrap_or(""));
    let chat_id = ChatId(msg.chat.id.0);
    let user_id = UserId(user.id.0 as i64);

    tracing::info!(user = user_id.0, command = %cmd, "command received");
    dispatch_command(&state, chat_id, user_id, &user.first_name, &cmd, &args).await;
    Ok(())
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub(crate) async fn dispatch_command(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    first_name: &str,
    cmd: &str,
    args: &str,
) {
    let reply = match cmd {
        "start" => welcome_text(first_name),
        "help" => help_text(state.cfg.authorized_debug_users.contains(&user_id.0)),
        "debug" => return handle_debug(state, chat_id, user_id, args).await,
        _ => "Unknown command. Use /help to see what I can do.".to_string(),
    };

    if let Err(e) = state.messenger.send_plain(chat_id, &reply).await {
        tracing::error!("failed to send command reply: {e}");
    }
}

fn welcome_text(first_name: &str) -> String {
    let name = if first_name.trim().is_empty() {
        "there"
    } else {
        first_name
    };
    format!(
        "Hi {name}! 👋 I'm Kelly, your virtual assistant.\n\n\
         I can help you with questions about MiAdminXML and MiExpedienteContable:\n\
         • How to use the programs\n\
         • Troubleshooting common problems\n\
         • Licensing and pricing information\n\
         • System requirements\n\n\
         Just type your question. For general help, use /help."
    )
}

fn help_text(authorized_for_debug: bool) -> String {
    let mut text = String::from(
        "How to use Kelly:\n\n\
         1. Ask your question directly in the chat.\n\
         2. I will search my knowledge base for the most relevant answer.\n\
         3. Be specific: the clearer the question, the better the answer.\n\n\
         Available commands:\n\
         /start - Start the conversation and show the welcome message.\n\
         /help - Show this help message.\n",
    );

    // The debug command is listed only for authorized users; whether their
    // toggle is on does not affect help output.
    if authorized_for_debug {
        text.push_str(
            "/debug on|off - Toggle the retrieval-source view (authorized users only).\n",
        );
    }

    text
}

async fn handle_debug(state: &AppState, chat_id: ChatId, user_id: UserId, args: &str) {
    if !state.cfg.authorized_debug_users.contains(&user_id.0) {
        tracing::warn!(user = user_id.0, "unauthorized /debug attempt");
        let _ = state
            .messenger
            .send_plain(chat_id, "Sorry, this command is only for authorized users.")
            .await;
        return;
    }

    let reply = match args.trim().to_lowercase().as_str() {
        "on" => match state.store.set_debug_mode(user_id, true).await {
            Ok(()) => {
                tracing::info!(user = user_id.0, "debug mode enabled");
                "✅ Debug mode enabled. Replies will now include retrieval sources.".to_string()
            }
            Err(e) => store_failure(e),
        },
        "off" => match state.store.set_debug_mode(user_id, false).await {
            Ok(()) => {
                tracing::info!(user = user_id.0, "debug mode disabled");
                "☑️ Debug mode disabled.".to_string()
            }
            Err(e) => store_failure(e),
        },
        _ => "Usage: /debug on or /debug off".to_string(),
    };

    let _ = state.messenger.send_plain(chat_id, &reply).await;
}

fn store_failure(e: kelly_core::Error) -> String {
    tracing::error!("failed to persist debug toggle: {e}");
    "Could not change debug mode. Please try again later.".to_string()
}
