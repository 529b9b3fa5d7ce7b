use thiserror::Error;

/// Everything that can go wrong between the chat widget and the server.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never produced a usable HTTP response.
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with an explicit `{"error": ...}` body.
    #[error("{0}")]
    Server(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Caught before any request is sent.
    #[error("{0}")]
    Validation(String),

    #[error("not allowed while the chat is {0}")]
    InvalidState(&'static str),

    #[error("{0} is only available to admins")]
    AdminOnly(&'static str),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ChatError::Transport(format!("could not read response: {err}"));
        }
        ChatError::Transport(err.to_string())
    }
}

/// User-initiated operations that report failures with a blocking alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    StartChat,
    LoadChat,
    SendMessage,
    CloseChat,
    ReopenChat,
}

impl UserAction {
    fn server_prefix(&self) -> &'static str {
        match self {
            UserAction::StartChat => "Error starting chat",
            UserAction::LoadChat => "Error loading chat",
            UserAction::SendMessage => "Failed to send message",
            UserAction::CloseChat => "Failed to close chat",
            UserAction::ReopenChat => "Failed to reopen chat",
        }
    }

    fn retry_text(&self) -> &'static str {
        match self {
            UserAction::StartChat => "Failed to start chat. Please try again.",
            UserAction::LoadChat => "Failed to load chat. Please try again.",
            UserAction::SendMessage => "Failed to send message. Please try again.",
            UserAction::CloseChat => "Failed to close chat. Please try again.",
            UserAction::ReopenChat => "Failed to reopen chat. Please try again.",
        }
    }
}

impl ChatError {
    /// Text for the alert shown after `action` failed. Transport problems get
    /// a generic retry prompt, server errors name the server's reason.
    pub fn alert_text(&self, action: UserAction) -> String {
        match self {
            ChatError::Server(reason) => format!("{}: {reason}", action.server_prefix()),
            ChatError::Transport(_) | ChatError::Decode(_) => action.retry_text().to_string(),
            other => other.to_string(),
        }
    }
}
