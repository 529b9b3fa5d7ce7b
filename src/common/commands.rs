use super::types::SessionId;

/// Lệnh UI gửi xuống chat controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// User view: ask the server for a new (or the existing active) session.
    StartChat,
    /// User view: reopen the session the server reports as active, if any.
    ResumeActive,
    OpenSession(SessionId),
    SendMessage(String),
    /// Admin view only.
    CloseSession,
    /// Admin view only.
    ReopenSession,
    /// Widget dismissed: stop polling and forget the session.
    Teardown,
    LoadHistory,
}
