use super::types::{ChatSession, SessionStatus, ViewerRole};

/// Lifecycle of the chat widget's session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// No session loaded.
    Closed,
    /// Session metadata and first page are being fetched.
    Opening,
    OpenActive,
    /// User view only: the session is active but no admin has joined yet.
    OpenWaiting,
    /// Another admin is handling the session.
    OpenLocked { owner: String },
    /// The session was closed server-side.
    OpenClosed,
}

impl ControllerState {
    /// State an open session should be shown in.
    pub fn for_session(role: ViewerRole, session: &ChatSession) -> Self {
        if session.status == SessionStatus::Closed {
            return ControllerState::OpenClosed;
        }
        if let Some(owner) = &session.lock_owner {
            return ControllerState::OpenLocked {
                owner: owner.clone(),
            };
        }
        if role == ViewerRole::User && !session.admin_connected {
            return ControllerState::OpenWaiting;
        }
        ControllerState::OpenActive
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ControllerState::Closed | ControllerState::Opening)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControllerState::Closed => "closed",
            ControllerState::Opening => "opening",
            ControllerState::OpenActive => "active",
            ControllerState::OpenWaiting => "waiting for an admin",
            ControllerState::OpenLocked { .. } => "locked",
            ControllerState::OpenClosed => "closed by the server",
        }
    }
}

/// Admin affordance shown next to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    None,
    CloseChat,
    ReopenChat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub title: String,
    pub detail: Option<String>,
}

/// What the input bar and its surroundings should look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputState {
    pub enabled: bool,
    pub placeholder: String,
    pub banner: Option<Banner>,
    pub action: SessionAction,
}

impl InputState {
    pub fn for_state(role: ViewerRole, state: &ControllerState) -> Self {
        match state {
            ControllerState::Closed | ControllerState::Opening => Self::disabled(""),
            ControllerState::OpenActive => Self {
                enabled: true,
                placeholder: "Type your message...".to_string(),
                banner: None,
                action: admin_only(role, SessionAction::CloseChat),
            },
            ControllerState::OpenWaiting => Self {
                banner: Some(Banner {
                    kind: BannerKind::Info,
                    title: "Please hold while we connect you to one of our admins...".to_string(),
                    detail: Some(
                        "You'll be able to chat once an admin joins the conversation.".to_string(),
                    ),
                }),
                ..Self::disabled("Waiting for admin to connect...")
            },
            ControllerState::OpenLocked { owner } => {
                let text = format!("This chat is currently being handled by {owner}");
                Self {
                    banner: Some(Banner {
                        kind: BannerKind::Warning,
                        title: text.clone(),
                        detail: None,
                    }),
                    ..Self::disabled(&text)
                }
            }
            ControllerState::OpenClosed => match role {
                ViewerRole::Admin => Self {
                    action: SessionAction::ReopenChat,
                    ..Self::disabled("This chat is closed. Reopen to send messages.")
                },
                ViewerRole::User => Self {
                    banner: Some(Banner {
                        kind: BannerKind::Danger,
                        title: "This chat has been closed".to_string(),
                        detail: Some(
                            "You can no longer send messages in this conversation.".to_string(),
                        ),
                    }),
                    ..Self::disabled("This chat is closed.")
                },
            },
        }
    }

    fn disabled(placeholder: &str) -> Self {
        Self {
            enabled: false,
            placeholder: placeholder.to_string(),
            banner: None,
            action: SessionAction::None,
        }
    }
}

fn admin_only(role: ViewerRole, action: SessionAction) -> SessionAction {
    match role {
        ViewerRole::Admin => action,
        ViewerRole::User => SessionAction::None,
    }
}

/// Input state as a function of the session fields alone.
pub fn input_state(
    role: ViewerRole,
    status: SessionStatus,
    lock_owner: Option<&str>,
    admin_connected: bool,
) -> InputState {
    let session = ChatSession {
        status,
        lock_owner: lock_owner.map(str::to_string),
        admin_connected,
        ..ChatSession::new("0".into(), status)
    };
    InputState::for_state(role, &ControllerState::for_session(role, &session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_unlocked_admin_session_is_enabled() {
        let state = input_state(ViewerRole::Admin, SessionStatus::Active, None, false);
        assert!(state.enabled);
        assert!(state.banner.is_none());
        assert_eq!(state.action, SessionAction::CloseChat);
    }

    #[test]
    fn locked_session_is_disabled_with_banner() {
        let state = input_state(ViewerRole::Admin, SessionStatus::Active, Some("Alice"), false);
        assert!(!state.enabled);
        let banner = state.banner.expect("locked sessions show a banner");
        assert_eq!(banner.title, "This chat is currently being handled by Alice");
        assert_eq!(state.action, SessionAction::None);
    }

    #[test]
    fn closed_session_offers_reopen_regardless_of_lock() {
        for owner in [None, Some("Bob")] {
            let state = input_state(ViewerRole::Admin, SessionStatus::Closed, owner, true);
            assert!(!state.enabled);
            assert_eq!(state.action, SessionAction::ReopenChat);
        }
    }

    #[test]
    fn user_waits_until_an_admin_joins() {
        let waiting = input_state(ViewerRole::User, SessionStatus::Active, None, false);
        assert!(!waiting.enabled);
        assert_eq!(waiting.placeholder, "Waiting for admin to connect...");

        let joined = input_state(ViewerRole::User, SessionStatus::Active, None, true);
        assert!(joined.enabled);
        assert_eq!(joined.action, SessionAction::None);
    }

    #[test]
    fn user_sees_closed_banner() {
        let state = input_state(ViewerRole::User, SessionStatus::Closed, None, true);
        assert!(!state.enabled);
        assert_eq!(state.action, SessionAction::None);
        assert_eq!(
            state.banner.map(|b| b.kind),
            Some(BannerKind::Danger)
        );
    }

    #[test]
    fn opening_is_never_enabled() {
        let state = InputState::for_state(ViewerRole::Admin, &ControllerState::Opening);
        assert!(!state.enabled);
    }
}
