use chrono::{DateTime, Utc};

use crate::common::{ChatSummary, SessionId, SessionStatus};

use super::time::DisplayClock;

/// Status tabs above the chat list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatFilter {
    #[default]
    All,
    Active,
    Closed,
}

impl ChatFilter {
    pub const ALL: [ChatFilter; 3] = [ChatFilter::All, ChatFilter::Active, ChatFilter::Closed];

    pub fn label(&self) -> &'static str {
        match self {
            ChatFilter::All => "All",
            ChatFilter::Active => "Ongoing",
            ChatFilter::Closed => "Resolved",
        }
    }

    pub fn matches(&self, status: SessionStatus) -> bool {
        match self {
            ChatFilter::All => true,
            ChatFilter::Active => status == SessionStatus::Active,
            ChatFilter::Closed => status == SessionStatus::Closed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub session_id: SessionId,
    pub status_label: &'static str,
    pub ongoing: bool,
    pub preview: String,
    pub time_label: String,
    pub count_label: String,
}

pub fn render_history(
    chats: &[ChatSummary],
    filter: ChatFilter,
    clock: &DisplayClock,
    now: DateTime<Utc>,
) -> Vec<HistoryRow> {
    chats
        .iter()
        .filter(|chat| filter.matches(chat.status))
        .map(|chat| {
            let ongoing = chat.status == SessionStatus::Active;
            HistoryRow {
                session_id: chat.session_id.clone(),
                status_label: if ongoing { "Ongoing" } else { "Resolved" },
                ongoing,
                preview: chat
                    .last_message
                    .clone()
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| "No messages yet".to_string()),
                time_label: clock.humanize(chat.last_message_at, now),
                count_label: format!("{} messages", chat.message_count),
            }
        })
        .collect()
}
