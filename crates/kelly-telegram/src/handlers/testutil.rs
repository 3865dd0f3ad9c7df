//! Fake port implementations for handler tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use kelly_core::{
    config::Config,
    domain::{ChatId, ChatResponse, MessageId, MessageRef, SessionKey, SourceEntry, UserId},
    ports::{ChatBackend, MessagingPort},
    store::UserStateStore,
    Result,
};

use crate::router::AppState;

pub struct FakeBackend {
    answer: String,
    sources: Vec<SourceEntry>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn chat(&self, message: &str, session: &SessionKey) -> ChatResponse {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), session.as_str().to_string()));
        ChatResponse {
            answer: self.answer.clone(),
            sources: self.sources.clone(),
            session_key: session.as_str().to_string(),
        }
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sends: Mutex<Vec<(i64, String, bool)>>,
}

impl FakeMessenger {
    pub fn sends(&self) -> Vec<(i64, String, bool)> {
        self.sends.lock().unwrap().clone()
    }

    fn record(&self, chat_id: ChatId, text: &str, rich: bool) -> MessageRef {
        self.sends
            .lock()
            .unwrap()
            .push((chat_id.0, text.to_string(), rich));
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        }
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_plain(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        Ok(self.record(chat_id, text, false))
    }

    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        Ok(self.record(chat_id, text, true))
    }
}

#[derive(Default)]
pub struct FakeStore {
    modes: Mutex<HashMap<i64, bool>>,
}

impl FakeStore {
    pub fn modes(&self) -> HashMap<i64, bool> {
        self.modes.lock().unwrap().clone()
    }

    pub fn set(&self, user_id: i64, enabled: bool) {
        self.modes.lock().unwrap().insert(user_id, enabled);
    }
}

#[async_trait]
impl UserStateStore for FakeStore {
    async fn debug_mode(&self, user_id: UserId) -> bool {
        self.modes
            .lock()
            .unwrap()
            .get(&user_id.0)
            .copied()
            .unwrap_or(false)
    }

    async fn set_debug_mode(&self, user_id: UserId, enabled: bool) -> Result<()> {
        self.modes.lock().unwrap().insert(user_id.0, enabled);
        Ok(())
    }
}

pub struct TestPorts {
    pub state: AppState,
    pub backend: Arc<FakeBackend>,
    pub messenger: Arc<FakeMessenger>,
    pub store: Arc<FakeStore>,
}

pub fn test_state(debug_users: Vec<i64>, answer: &str, sources: Vec<SourceEntry>) -> TestPorts {
    let cfg = Arc::new(Config {
        telegram_bot_token: "x".to_string(),
        api_base_url: "http://localhost:8000".to_string(),
        api_access_key: "k".to_string(),
        api_connect_timeout: Duration::from_secs(10),
        api_read_timeout: Duration::from_secs(180),
        authorized_debug_users: debug_users,
        persistence_file: "/tmp/kelly-telegram-users-test.json".into(),
    });

    let backend = Arc::new(FakeBackend {
        answer: answer.to_string(),
        sources,
        calls: Mutex::new(Vec::new()),
    });
    let messenger = Arc::new(FakeMessenger::default());
    let store = Arc::new(FakeStore::default());

    let state = AppState {
        cfg,
        backend: backend.clone(),
        messenger: messenger.clone(),
        store: store.clone(),
    };

    TestPorts {
        state,
        backend,
        messenger,
        store,
    }
}
