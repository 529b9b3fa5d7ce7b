//! Turns message lists into the nodes shown in the chat container.
//!
//! Rendering is a pure function of the input: the caller replaces the whole
//! container with the result, so overlapping reloads can never leave
//! duplicate bubbles behind.

pub mod escape;
pub mod history;
pub mod time;

use chrono::{DateTime, Utc};

use crate::common::{ChatMessage, SenderRole, ViewerRole};

use escape::escape_html;
use time::DisplayClock;

pub const EMPTY_THREAD_TEXT: &str = "No messages yet.";

/// Whose eyes the thread is rendered for.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub role: ViewerRole,
    /// Display name of the user on the other end (admin view).
    pub participant: Option<String>,
    pub clock: DisplayClock,
}

impl Viewer {
    pub fn new(role: ViewerRole, offset_hours: i32) -> Self {
        Self {
            role,
            participant: None,
            clock: DisplayClock::new(offset_hours, role == ViewerRole::Admin),
        }
    }

    pub fn with_participant(mut self, participant: Option<String>) -> Self {
        self.participant = participant;
        self
    }

    pub fn sender_label(&self, sender: SenderRole) -> String {
        match (self.role, sender) {
            (_, SenderRole::System) => "System".to_string(),
            (ViewerRole::Admin, SenderRole::User) => self
                .participant
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "User".to_string()),
            (ViewerRole::Admin, SenderRole::Admin) => "You (Admin)".to_string(),
            (ViewerRole::User, SenderRole::User) => "You".to_string(),
            (ViewerRole::User, SenderRole::Admin) => "Support Agent".to_string(),
        }
    }
}

/// A single chat bubble. Fields hold plain text; [`RenderedMessage::to_html`]
/// is the only way they reach markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub sender: SenderRole,
    pub sender_label: String,
    pub text: String,
    pub time_label: String,
}

impl RenderedMessage {
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"message-bubble message-{}\">\
             <div class=\"message-sender\">{}</div>\
             <div class=\"message-text\">{}</div>\
             <div class=\"message-time\">{}</div>\
             </div>",
            self.sender.css_suffix(),
            escape_html(&self.sender_label),
            escape_html(&self.text),
            escape_html(&self.time_label),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RenderedThread {
    /// Rendered as a single placeholder node.
    #[default]
    Empty,
    Messages(Vec<RenderedMessage>),
}

impl RenderedThread {
    pub fn messages(&self) -> &[RenderedMessage] {
        match self {
            RenderedThread::Empty => &[],
            RenderedThread::Messages(messages) => messages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }

    pub fn to_html(&self) -> String {
        match self {
            RenderedThread::Empty => {
                format!("<p class=\"chat-empty\">{EMPTY_THREAD_TEXT}</p>")
            }
            RenderedThread::Messages(messages) => {
                messages.iter().map(RenderedMessage::to_html).collect()
            }
        }
    }
}

pub fn render_thread(
    messages: &[ChatMessage],
    viewer: &Viewer,
    now: DateTime<Utc>,
) -> RenderedThread {
    if messages.is_empty() {
        return RenderedThread::Empty;
    }

    let mut ordered: Vec<&ChatMessage> = messages.iter().collect();
    ordered.sort_by_key(|message| message.created_at);

    RenderedThread::Messages(
        ordered
            .into_iter()
            .map(|message| RenderedMessage {
                sender: message.sender,
                sender_label: viewer.sender_label(message.sender),
                text: message.text.clone(),
                time_label: viewer.clock.humanize(message.created_at, now),
            })
            .collect(),
    )
}
