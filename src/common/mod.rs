pub mod commands;
pub mod error;
pub mod events;
pub mod session;
pub mod types;

pub use commands::ChatCommand;
pub use error::{ChatError, UserAction};
pub use events::ChatEvent;
pub use session::{Banner, BannerKind, ControllerState, InputState, SessionAction, input_state};
pub use types::{
    ChatMessage, ChatSession, ChatSummary, MessagePage, SenderRole, SessionId, SessionSnapshot,
    SessionStatus, ViewerRole,
};
