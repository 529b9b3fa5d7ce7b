#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;

use skillswap_chat::common::{
    ChatError, ChatEvent, ChatMessage, ChatSession, ChatSummary, MessagePage, SenderRole,
    SessionId, SessionSnapshot, SessionStatus, ViewerRole,
};
use skillswap_chat::network::{ChatController, ChatTransport};

pub const POLL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub struct FakeSession {
    pub status: SessionStatus,
    pub lock_owner: Option<String>,
    pub participant: Option<String>,
    pub admin_connected: bool,
    pub messages: Vec<ChatMessage>,
}

impl FakeSession {
    pub fn active() -> Self {
        Self {
            status: SessionStatus::Active,
            lock_owner: None,
            participant: Some("Mei Ling".to_string()),
            admin_connected: true,
            messages: Vec::new(),
        }
    }
}

#[derive(Default)]
struct FakeServer {
    sessions: HashMap<SessionId, FakeSession>,
    calls: Vec<String>,
    open_error: Option<String>,
    send_error: Option<ChatError>,
    next_session: u64,
    active: Option<SessionId>,
    history: Vec<ChatSummary>,
}

/// In-memory stand-in for the SkillSwap server. Records every call as the
/// endpoint it would have hit.
#[derive(Clone)]
pub struct FakeTransport {
    role: ViewerRole,
    server: Arc<Mutex<FakeServer>>,
}

impl FakeTransport {
    pub fn new(role: ViewerRole) -> Self {
        Self {
            role,
            server: Arc::new(Mutex::new(FakeServer {
                next_session: 100,
                ..FakeServer::default()
            })),
        }
    }

    pub fn with_session(self, id: &str, session: FakeSession) -> Self {
        self.server
            .lock()
            .unwrap()
            .sessions
            .insert(SessionId::from(id), session);
        self
    }

    pub fn fail_open_with(&self, reason: &str) {
        self.server.lock().unwrap().open_error = Some(reason.to_string());
    }

    pub fn fail_send_with(&self, err: ChatError) {
        self.server.lock().unwrap().send_error = Some(err);
    }

    pub fn set_active(&self, id: Option<&str>) {
        self.server.lock().unwrap().active = id.map(SessionId::from);
    }

    pub fn set_history(&self, history: Vec<ChatSummary>) {
        self.server.lock().unwrap().history = history;
    }

    pub fn update(&self, id: &str, change: impl FnOnce(&mut FakeSession)) {
        let mut server = self.server.lock().unwrap();
        if let Some(session) = server.sessions.get_mut(&SessionId::from(id)) {
            change(session);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.server.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn clear_calls(&self) {
        self.server.lock().unwrap().calls.clear();
    }

    fn messages_call(&self, id: &SessionId) -> String {
        match self.role {
            ViewerRole::User => format!("GET /get-messages/{id}"),
            ViewerRole::Admin => format!("GET /admin/get-chat-messages/{id}"),
        }
    }

    fn page(&self, server: &FakeServer, id: &SessionId) -> Result<MessagePage, ChatError> {
        let session = server
            .sessions
            .get(id)
            .ok_or_else(|| ChatError::Server("Chat session not found".to_string()))?;
        let mut page = MessagePage::new(id.clone(), session.messages.clone());
        if self.role == ViewerRole::User {
            page.status = Some(session.status);
            page.admin_connected = Some(session.admin_connected);
        }
        Ok(page)
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn start_chat(&self) -> Result<SessionId, ChatError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push("POST /start-chat".to_string());
        if let Some(active) = server.active.clone() {
            return Ok(active);
        }
        server.next_session += 1;
        let id = SessionId::from(server.next_session);
        let mut session = FakeSession::active();
        session.admin_connected = false;
        server.sessions.insert(id.clone(), session);
        server.active = Some(id.clone());
        Ok(id)
    }

    async fn open_session(&self, id: &SessionId) -> Result<SessionSnapshot, ChatError> {
        let mut server = self.server.lock().unwrap();
        match self.role {
            ViewerRole::Admin => server.calls.push(format!("GET /admin/get-chat-details/{id}")),
            ViewerRole::User => {}
        }
        let messages_call = self.messages_call(id);
        server.calls.push(messages_call);

        if let Some(reason) = server.open_error.clone() {
            return Err(ChatError::Server(reason));
        }
        let page = self.page(&server, id)?;
        let fake = &server.sessions[id];
        let session = ChatSession {
            id: id.clone(),
            status: fake.status,
            lock_owner: fake.lock_owner.clone(),
            participant: fake.participant.clone(),
            admin_connected: fake.admin_connected,
        };
        Ok(SessionSnapshot { session, page })
    }

    async fn fetch_messages(&self, id: &SessionId) -> Result<MessagePage, ChatError> {
        let mut server = self.server.lock().unwrap();
        let call = self.messages_call(id);
        server.calls.push(call);
        self.page(&server, id)
    }

    async fn send_message(&self, id: &SessionId, text: &str) -> Result<(), ChatError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push(match self.role {
            ViewerRole::User => "POST /send-message".to_string(),
            ViewerRole::Admin => "POST /admin/send-chat-message".to_string(),
        });
        if let Some(err) = server.send_error.take() {
            return Err(err);
        }
        let sender = match self.role {
            ViewerRole::User => SenderRole::User,
            ViewerRole::Admin => SenderRole::Admin,
        };
        let session = server
            .sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::Server("Chat session not found".to_string()))?;
        session.messages.push(ChatMessage {
            sender,
            text: text.to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        });
        Ok(())
    }

    async fn close_session(&self, id: &SessionId) -> Result<(), ChatError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push(format!("POST /admin/close-chat/{id}"));
        let session = server
            .sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::Server("Chat session not found".to_string()))?;
        session.status = SessionStatus::Closed;
        Ok(())
    }

    async fn reopen_session(&self, id: &SessionId) -> Result<(), ChatError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push(format!("POST /admin/reopen-chat/{id}"));
        let session = server
            .sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::Server("Chat session not found".to_string()))?;
        session.status = SessionStatus::Active;
        Ok(())
    }

    async fn active_session(&self) -> Result<Option<SessionId>, ChatError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push("GET /get-active-chat".to_string());
        Ok(server.active.clone())
    }

    async fn chat_history(&self) -> Result<Vec<ChatSummary>, ChatError> {
        let mut server = self.server.lock().unwrap();
        server.calls.push("GET /get-chat-history".to_string());
        Ok(server.history.clone())
    }
}

pub fn message(sender: SenderRole, text: &str) -> ChatMessage {
    ChatMessage {
        sender,
        text: text.to_string(),
        created_at: None,
    }
}

pub fn controller(
    role: ViewerRole,
    transport: &FakeTransport,
) -> (ChatController, mpsc::Receiver<ChatEvent>) {
    let (event_sender, event_receiver) = mpsc::channel(256);
    let controller = ChatController::new(
        role,
        Arc::new(transport.clone()),
        POLL,
        8,
        event_sender,
    );
    (controller, event_receiver)
}

pub fn drain(events: &mut mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn alerts(events: &[ChatEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ChatEvent::Alert(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}
