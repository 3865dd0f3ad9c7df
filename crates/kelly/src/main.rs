use std::sync::Arc;

use kelly_api::ApiClient;

use kelly_core::{
    config::Config,
    ports::ChatBackend,
    store::{JsonStateStore, UserStateStore},
};

#[tokio::main]
async fn main() -> Result<(), kelly_core::Error> {
    kelly_core::logging::init("kelly")?;

    let cfg = Arc::new(Config::load()?);

    let backend: Arc<dyn ChatBackend> = Arc::new(ApiClient::new(&cfg));
    let store: Arc<dyn UserStateStore> =
        Arc::new(JsonStateStore::load(cfg.persistence_file.clone()));

    kelly_telegram::router::run_polling(cfg, backend, store)
        .await
        .map_err(|e| kelly_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
