//! Per-user mutable state, behind an injected store interface.
//!
//! The only per-user state the bot keeps is the debug-source toggle. It is
//! modeled as an explicit key-value store handed to the handling path rather
//! than a process-wide global.

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{domain::UserId, Result};

#[async_trait]
pub trait UserStateStore: Send + Sync {
    /// Current debug toggle for a user; defaults to off.
    async fn debug_mode(&self, user_id: UserId) -> bool;

    /// Flip the debug toggle. Only the command path calls this.
    async fn set_debug_mode(&self, user_id: UserId, enabled: bool) -> Result<()>;
}

/// JSON-file-backed store. State is held in memory and flushed on every write
/// so toggles survive restarts.
pub struct JsonStateStore {
    path: PathBuf,
    debug_modes: Mutex<HashMap<i64, bool>>,
}

impl JsonStateStore {
    /// Load existing state from `path`, starting empty if the file is missing
    /// or unreadable.
    pub fn load(path: PathBuf) -> Self {
        let debug_modes = std::fs::read_to_string(&path)
            .ok()
            .and_then(|txt| serde_json::from_str::<HashMap<i64, bool>>(&txt).ok())
            .unwrap_or_default();

        Self {
            path,
            debug_modes: Mutex::new(debug_modes),
        }
    }

    async fn flush(&self, snapshot: &HashMap<i64, bool>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let txt = serde_json::to_string(snapshot)?;
        tokio::fs::write(&self.path, txt).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStateStore for JsonStateStore {
    async fn debug_mode(&self, user_id: UserId) -> bool {
        self.debug_modes
            .lock()
            .await
            .get(&user_id.0)
            .copied()
            .unwrap_or(false)
    }

    async fn set_debug_mode(&self, user_id: UserId, enabled: bool) -> Result<()> {
        let snapshot = {
            let mut map = self.debug_modes.lock().await;
            map.insert(user_id.0, enabled);
            map.clone()
        };
        self.flush(&snapshot).await
    }
}
