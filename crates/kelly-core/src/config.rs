use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the bot, loaded from the environment (plus an
/// optional `.env` file in the working directory).
///
/// Required values are checked here so the process fails at startup instead of
/// degrading into dummy behavior at request time.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // Kelly API backend
    pub api_base_url: String,
    pub api_access_key: String,
    pub api_connect_timeout: Duration,
    pub api_read_timeout: Duration,

    // Debug-source visibility
    pub authorized_debug_users: Vec<i64>,

    // Per-user state persistence
    pub persistence_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let api_base_url = env_str("KELLYBOT_API_URL").unwrap_or_default();
        if api_base_url.trim().is_empty() {
            return Err(Error::Config(
                "KELLYBOT_API_URL environment variable is required".to_string(),
            ));
        }

        let api_access_key = env_str("API_ACCESS_KEY").unwrap_or_default();
        if api_access_key.trim().is_empty() {
            return Err(Error::Config(
                "API_ACCESS_KEY environment variable is required".to_string(),
            ));
        }

        // Read timeout is long because backend answer generation may be slow.
        let api_connect_timeout =
            Duration::from_secs_f64(env_f64("API_TIMEOUT_CONNECT").unwrap_or(10.0));
        let api_read_timeout =
            Duration::from_secs_f64(env_f64("API_TIMEOUT_READ").unwrap_or(180.0));

        let authorized_debug_users = parse_csv_i64(env_str("AUTHORIZED_DEBUG_USERS"));

        let persistence_file = PathBuf::from(
            env_str("PERSISTENCE_FILE_PATH")
                .unwrap_or("/tmp/kelly-telegram-users.json".to_string()),
        );

        Ok(Self {
            telegram_bot_token,
            api_base_url,
            api_access_key,
            api_connect_timeout,
            api_read_timeout,
            authorized_debug_users,
            persistence_file,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_f64(key: &str) -> Option<f64> {
    env_str(key).and_then(|s| s.trim().parse::<f64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    let mut out = Vec::new();
    for part in v.unwrap_or_default().split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<i64>() {
            Ok(id) => out.push(id),
            Err(_) => {
                tracing::warn!("ignoring invalid id in AUTHORIZED_DEBUG_USERS: {part:?}");
            }
        }
    }
    out
}
