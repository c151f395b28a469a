//! Session Management
//!
//! Sessions are keyed by `(app, user, session_id)` and live for the lifetime
//! of the process. A session is created at most once per key; every later
//! lookup returns the same `Arc<Session>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::Result;
use crate::message::{Conversation, Message};

/// Mutable key/value state attached to a session
pub type SessionState = HashMap<String, serde_json::Value>;

/// Session identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Fresh globally-unique session identifier
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

#[derive(Debug)]
struct SessionData {
    state: SessionState,
    conversation: Conversation,
    active_agent: Option<String>,
    updated_at: DateTime<Utc>,
}

/// Conversational context for one `(app, user, session_id)`
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    created_at: DateTime<Utc>,
    data: Mutex<SessionData>,
    turn: Arc<Mutex<()>>,
}

impl Session {
    pub fn new(key: SessionKey, state: SessionState) -> Self {
        let now = Utc::now();
        Self {
            key,
            created_at: now,
            data: Mutex::new(SessionData {
                state,
                conversation: Conversation::new(),
                active_agent: None,
                updated_at: now,
            }),
            turn: Arc::new(Mutex::new(())),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn id(&self) -> &str {
        &self.key.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn updated_at(&self) -> DateTime<Utc> {
        self.data.lock().await.updated_at
    }

    /// Serialize processing on this session. Held for a whole pass.
    pub async fn begin_turn(&self) -> OwnedMutexGuard<()> {
        self.turn.clone().lock_owned().await
    }

    /// Read a state value
    pub async fn get_state(&self, key: &str) -> Option<serde_json::Value> {
        self.data.lock().await.state.get(key).cloned()
    }

    /// Write a state value
    pub async fn set_state(&self, key: impl Into<String>, value: serde_json::Value) {
        let mut data = self.data.lock().await;
        data.state.insert(key.into(), value);
        data.updated_at = Utc::now();
    }

    /// Copy of the whole state map
    pub async fn state(&self) -> SessionState {
        self.data.lock().await.state.clone()
    }

    /// Copy of the conversation history
    pub async fn history(&self) -> Vec<Message> {
        self.data.lock().await.conversation.messages().to_vec()
    }

    /// Append messages to the history, trimming it to the context budget
    pub async fn record(&self, messages: impl IntoIterator<Item = Message> + Send) {
        let mut data = self.data.lock().await;
        for message in messages {
            data.conversation.push(message);
        }
        data.conversation.truncate_to_fit();
        data.updated_at = Utc::now();
    }

    /// Agent that answered last; the next pass starts there
    pub async fn active_agent(&self) -> Option<String> {
        self.data.lock().await.active_agent.clone()
    }

    pub async fn set_active_agent(&self, agent: impl Into<String>) {
        let mut data = self.data.lock().await;
        data.active_agent = Some(agent.into());
        data.updated_at = Utc::now();
    }
}

/// Session store
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session; absence is not an error
    async fn get(&self, key: &SessionKey) -> Result<Option<Arc<Session>>>;

    /// Create a session with the given initial state
    async fn create(&self, key: &SessionKey, state: SessionState) -> Result<Arc<Session>>;

    /// Return the existing session or create one
    async fn get_or_create(&self, key: &SessionKey, state: SessionState) -> Result<Arc<Session>> {
        match self.get(key).await? {
            Some(session) => Ok(session),
            None => self.create(key, state).await,
        }
    }

    /// Sessions of one user, most recently updated first
    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Arc<Session>>>;
}

/// In-memory session store
///
/// `create` is atomic per key: concurrent creates for the same identity
/// resolve to one instance.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionKey, Arc<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<Arc<Session>>> {
        Ok(self.sessions.get(key).map(|entry| entry.value().clone()))
    }

    async fn create(&self, key: &SessionKey, state: SessionState) -> Result<Arc<Session>> {
        let session = self
            .sessions
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(session = %key, "Creating session");
                Arc::new(Session::new(key.clone(), state))
            })
            .value()
            .clone();
        Ok(session)
    }

    async fn get_or_create(&self, key: &SessionKey, state: SessionState) -> Result<Arc<Session>> {
        self.create(key, state).await
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Arc<Session>>> {
        let matching: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .filter(|entry| entry.key().app_name == app_name && entry.key().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();

        let mut stamped = Vec::with_capacity(matching.len());
        for session in matching {
            let updated = session.updated_at().await;
            stamped.push((updated, session));
        }
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(stamped.into_iter().map(|(_, s)| s).collect())
    }
}
