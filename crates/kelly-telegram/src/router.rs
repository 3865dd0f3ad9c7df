use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use kelly_core::{
    config::Config,
    ports::{ChatBackend, MessagingPort},
    store::UserStateStore,
};

use crate::handlers;
use crate::TelegramMessenger;

/// Shared dependencies for update handlers.
///
/// Everything mutable lives behind the store; handlers themselves are
/// stateless and may run concurrently.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub backend: Arc<dyn ChatBackend>,
    pub messenger: Arc<dyn MessagingPort>,
    pub store: Arc<dyn UserStateStore>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    backend: Arc<dyn ChatBackend>,
    store: Arc<dyn UserStateStore>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!("kelly bot started: @{}", me.username());
    }
    tracing::info!(
        "authorized debug users: {}",
        cfg.authorized_debug_users.len()
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        cfg,
        backend,
        messenger,
        store,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
