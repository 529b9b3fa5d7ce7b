use std::time::{Duration, Instant};

use skillswap_chat::common::{
    ChatEvent, ChatSession, ChatSummary, ControllerState, InputState, ViewerRole,
};
use skillswap_chat::render::RenderedThread;
use skillswap_chat::render::history::ChatFilter;

/// Thời gian hiển thị một toast.
pub const TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub shown_at: Instant,
}

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub role: ViewerRole,
    pub controller_state: ControllerState,
    pub input: InputState,
    pub session: Option<ChatSession>,
    pub thread: RenderedThread,
    pub history: Vec<ChatSummary>,
    pub filter: ChatFilter,
    pub input_text: String,
    /// Ô nhập mã phiên cho admin
    pub session_id_input: String,
    pub toasts: Vec<Toast>,
    /// Lỗi đang chờ người dùng xác nhận
    pub alert: Option<String>,
}

impl AppState {
    pub fn new(role: ViewerRole) -> Self {
        let controller_state = ControllerState::Closed;
        Self {
            role,
            input: InputState::for_state(role, &controller_state),
            controller_state,
            session: None,
            thread: RenderedThread::Empty,
            history: Vec::new(),
            filter: ChatFilter::All,
            input_text: String::new(),
            session_id_input: String::new(),
            toasts: Vec::new(),
            alert: None,
        }
    }

    /// Applies one controller event. Returns true when the history list
    /// should be fetched again.
    pub fn apply(&mut self, event: ChatEvent) -> bool {
        match event {
            ChatEvent::StateChanged {
                state,
                input,
                session,
            } => {
                self.controller_state = state;
                self.input = input;
                self.session = session;
            }
            ChatEvent::ThreadRendered(thread) => self.thread = thread,
            ChatEvent::MessageSent => self.input_text.clear(),
            ChatEvent::AdminConnected => self.push_toast("An admin has joined the chat"),
            ChatEvent::Alert(text) => self.alert = Some(text),
            ChatEvent::Notice(text) => self.push_toast(text),
            ChatEvent::HistoryLoaded(chats) => self.history = chats,
            ChatEvent::ResyncRequested => return true,
        }
        false
    }

    pub fn push_toast(&mut self, text: impl Into<String>) {
        self.toasts.push(Toast {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| now.duration_since(toast.shown_at) < TOAST_LIFETIME);
    }

    pub fn title(&self) -> String {
        match &self.session {
            Some(session) => match (&session.participant, self.role) {
                (Some(name), ViewerRole::Admin) => format!("Chat #{} with {name}", session.id),
                _ => format!("Chat #{}", session.id),
            },
            None => "SkillSwap Support".to_string(),
        }
    }
}
