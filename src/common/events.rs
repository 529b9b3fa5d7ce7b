use super::session::{ControllerState, InputState};
use super::types::{ChatSession, ChatSummary};
use crate::render::RenderedThread;

/// Sự kiện từ chat controller gửi lên UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    StateChanged {
        state: ControllerState,
        input: InputState,
        session: Option<ChatSession>,
    },
    /// Replaces the whole message container.
    ThreadRendered(RenderedThread),
    /// The last send succeeded; the input can be cleared.
    MessageSent,
    /// An admin joined the user's session.
    AdminConnected,
    /// Blocking alert for a failed user action.
    Alert(String),
    /// Non-blocking hint, e.g. a rejected empty message.
    Notice(String),
    HistoryLoaded(Vec<ChatSummary>),
    /// Session status changed server-side; counts shown elsewhere are stale.
    ResyncRequested,
}
