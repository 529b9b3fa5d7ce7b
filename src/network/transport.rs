use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::common::{
    ChatError, ChatMessage, ChatSession, ChatSummary, MessagePage, SessionId, SessionSnapshot,
    SessionStatus, ViewerRole,
};
use crate::config::AppConfig;

/// Server calls the chat widget depends on. The HTTP implementation picks
/// user or admin endpoints; tests plug in an in-memory one.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Creates a session, or returns the user's existing active one.
    async fn start_chat(&self) -> Result<SessionId, ChatError>;

    /// Session metadata plus the first page of messages.
    async fn open_session(&self, id: &SessionId) -> Result<SessionSnapshot, ChatError>;

    async fn fetch_messages(&self, id: &SessionId) -> Result<MessagePage, ChatError>;

    async fn send_message(&self, id: &SessionId, text: &str) -> Result<(), ChatError>;

    async fn close_session(&self, id: &SessionId) -> Result<(), ChatError>;

    async fn reopen_session(&self, id: &SessionId) -> Result<(), ChatError>;

    async fn active_session(&self) -> Result<Option<SessionId>, ChatError>;

    async fn chat_history(&self) -> Result<Vec<ChatSummary>, ChatError>;
}

#[derive(Debug, Deserialize)]
struct StartChatBody {
    session_id: Option<SessionId>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesBody {
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    admin_connected: Option<bool>,
    #[serde(default)]
    status: Option<SessionStatus>,
}

impl MessagesBody {
    fn into_page(self, id: &SessionId) -> MessagePage {
        MessagePage {
            session_id: id.clone(),
            messages: self.messages,
            status: self.status,
            admin_connected: self.admin_connected,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatDetailsBody {
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    status: Option<SessionStatus>,
    #[serde(default)]
    is_locked: bool,
    #[serde(default)]
    locked_by_admin: Option<String>,
}

impl ChatDetailsBody {
    fn into_session(self, id: &SessionId) -> ChatSession {
        let status = self.status.unwrap_or(SessionStatus::Active);
        let mut session = ChatSession::new(id.clone(), status);
        session.participant = self.user_name;
        if self.is_locked {
            session.lock_owner = Some(
                self.locked_by_admin
                    .filter(|owner| !owner.trim().is_empty())
                    .unwrap_or_else(|| "another admin".to_string()),
            );
        }
        session
    }
}

/// The user endpoint carries status and admin presence on the message list
/// itself.
fn user_session(id: &SessionId, page: &MessagePage) -> ChatSession {
    let mut session = ChatSession::new(id.clone(), page.status.unwrap_or(SessionStatus::Active));
    session.admin_connected = page.admin_connected.unwrap_or(false);
    session
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActiveChatBody {
    #[serde(default)]
    has_active: bool,
    #[serde(default)]
    session_id: Option<SessionId>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    chats: Vec<ChatSummary>,
}

fn error_reason(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Decodes a JSON body, treating any `error` field as an application error.
fn decode_body<T: DeserializeOwned>(body: Value) -> Result<T, ChatError> {
    if let Some(reason) = error_reason(&body) {
        return Err(ChatError::Server(reason));
    }
    Ok(serde_json::from_value(body)?)
}

/// Classifies a raw response. A JSON `error` field wins over the HTTP
/// status; error statuses without one name the status instead.
fn check_response(status: StatusCode, text: &str) -> Result<(), ChatError> {
    let reason = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| error_reason(&body));

    match reason {
        Some(reason) => Err(ChatError::Server(reason)),
        None if status.is_success() => Ok(()),
        None => Err(ChatError::Server(format!("server responded with {status}"))),
    }
}

fn expect_status(body: StatusBody, expected: &str) -> Result<(), ChatError> {
    match body.status.as_deref() {
        Some(status) if status == expected => Ok(()),
        Some(other) => Err(ChatError::Server(format!("unexpected status `{other}`"))),
        None => Err(ChatError::Server("Unknown error".to_string())),
    }
}

/// reqwest-backed transport for one viewer role.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    role: ViewerRole,
}

impl HttpTransport {
    pub fn new(config: &AppConfig) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie).map_err(|err| {
                ChatError::Validation(format!("session cookie is not a valid header: {err}"))
            })?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            role: config.role,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn messages_path(&self, id: &SessionId) -> String {
        match self.role {
            ViewerRole::User => format!("get-messages/{id}"),
            ViewerRole::Admin => format!("admin/get-chat-messages/{id}"),
        }
    }

    fn require_admin(&self, operation: &'static str) -> Result<(), ChatError> {
        match self.role {
            ViewerRole::Admin => Ok(()),
            ViewerRole::User => Err(ChatError::AdminOnly(operation)),
        }
    }

    fn require_user(&self, operation: &'static str) -> Result<(), ChatError> {
        match self.role {
            ViewerRole::User => Ok(()),
            ViewerRole::Admin => Err(ChatError::Validation(format!(
                "{operation} is only available in the user view"
            ))),
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ChatError> {
        let url = self.url(path);
        log::debug!("{method} {url}");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    /// Reads the JSON body of a successful response.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
        let status = response.status();
        let text = response.text().await?;
        check_response(status, &text)?;
        decode_body(serde_json::from_str(&text)?)
    }

    /// Like [`Self::read_json`] for endpoints where a 2xx status is the
    /// whole answer and the body may not be JSON at all.
    async fn read_ok(response: Response) -> Result<(), ChatError> {
        let status = response.status();
        let text = response.text().await?;
        check_response(status, &text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChatError> {
        let response = self.request(Method::GET, path, None).await?;
        Self::read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ChatError> {
        let response = self.request(Method::POST, path, body).await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn start_chat(&self) -> Result<SessionId, ChatError> {
        self.require_user("starting a chat")?;
        let body: StartChatBody = self.post_json("start-chat", Some(json!({}))).await?;
        let id = body
            .session_id
            .ok_or_else(|| ChatError::Server("no session id in response".to_string()))?;
        log::info!(
            "Chat session {id} ready ({})",
            body.status.as_deref().unwrap_or("unknown")
        );
        Ok(id)
    }

    async fn open_session(&self, id: &SessionId) -> Result<SessionSnapshot, ChatError> {
        match self.role {
            ViewerRole::Admin => {
                let details: ChatDetailsBody =
                    self.get_json(&format!("admin/get-chat-details/{id}")).await?;
                let page = self.fetch_messages(id).await?;
                Ok(SessionSnapshot {
                    session: details.into_session(id),
                    page,
                })
            }
            ViewerRole::User => {
                let page = self.fetch_messages(id).await?;
                Ok(SessionSnapshot {
                    session: user_session(id, &page),
                    page,
                })
            }
        }
    }

    async fn fetch_messages(&self, id: &SessionId) -> Result<MessagePage, ChatError> {
        let body: MessagesBody = self.get_json(&self.messages_path(id)).await?;
        Ok(body.into_page(id))
    }

    async fn send_message(&self, id: &SessionId, text: &str) -> Result<(), ChatError> {
        let payload = json!({ "session_id": id, "message": text });
        match self.role {
            ViewerRole::Admin => {
                let body: StatusBody = self
                    .post_json("admin/send-chat-message", Some(payload))
                    .await?;
                expect_status(body, "sent")
            }
            ViewerRole::User => {
                let response = self
                    .request(Method::POST, "send-message", Some(payload))
                    .await?;
                Self::read_ok(response).await
            }
        }
    }

    async fn close_session(&self, id: &SessionId) -> Result<(), ChatError> {
        self.require_admin("closing a chat")?;
        let body: StatusBody = self.post_json(&format!("admin/close-chat/{id}"), None).await?;
        expect_status(body, "closed")
    }

    async fn reopen_session(&self, id: &SessionId) -> Result<(), ChatError> {
        self.require_admin("reopening a chat")?;
        let body: StatusBody = self
            .post_json(&format!("admin/reopen-chat/{id}"), None)
            .await?;
        expect_status(body, "reopened")
    }

    async fn active_session(&self) -> Result<Option<SessionId>, ChatError> {
        self.require_user("looking up the active chat")?;
        let body: ActiveChatBody = self.get_json("get-active-chat").await?;
        Ok(body.session_id.filter(|_| body.has_active))
    }

    async fn chat_history(&self) -> Result<Vec<ChatSummary>, ChatError> {
        self.require_user("loading chat history")?;
        let body: HistoryBody = self.get_json("get-chat-history").await?;
        Ok(body.chats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ControllerState;

    fn transport(role: ViewerRole) -> HttpTransport {
        let config = AppConfig {
            base_url: "http://localhost:5000/".to_string(),
            role,
            ..AppConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn error_field_becomes_server_error() {
        let result = decode_body::<StatusBody>(json!({ "error": "not found" }));
        assert!(matches!(result, Err(ChatError::Server(reason)) if reason == "not found"));
    }

    #[test]
    fn null_error_field_is_success() {
        let body: StatusBody = decode_body(json!({ "status": "sent", "error": null })).unwrap();
        assert_eq!(body.status.as_deref(), Some("sent"));
    }

    #[test]
    fn unexpected_status_is_reported() {
        let body = StatusBody {
            status: Some("pending".into()),
        };
        assert!(matches!(
            expect_status(body, "closed"),
            Err(ChatError::Server(reason)) if reason.contains("pending")
        ));
        assert!(expect_status(StatusBody { status: None }, "sent").is_err());
    }

    #[test]
    fn endpoints_follow_role() {
        let id = SessionId::from(42);
        assert_eq!(
            transport(ViewerRole::User).url(&transport(ViewerRole::User).messages_path(&id)),
            "http://localhost:5000/get-messages/42"
        );
        let admin = transport(ViewerRole::Admin);
        assert_eq!(
            admin.url(&admin.messages_path(&id)),
            "http://localhost:5000/admin/get-chat-messages/42"
        );
    }

    #[test]
    fn messages_body_parses_user_payload() {
        let body: MessagesBody = decode_body(json!({
            "messages": [
                { "sender_type": "user", "message_text": "hi", "created_at": "2025-01-01 08:00:00" }
            ],
            "admin_connected": true,
            "status": "active"
        }))
        .unwrap();
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.admin_connected, Some(true));
        assert_eq!(body.status, Some(SessionStatus::Active));
    }

    #[test]
    fn locked_details_name_the_owner() {
        let body: ChatDetailsBody = decode_body(json!({
            "user_name": "Mei Ling",
            "status": "active",
            "is_locked": true,
            "locked_by_admin": "Admin Tan"
        }))
        .unwrap();
        let session = body.into_session(&SessionId::from(7));

        assert_eq!(session.lock_owner.as_deref(), Some("Admin Tan"));
        assert_eq!(session.participant.as_deref(), Some("Mei Ling"));
        assert_eq!(
            ControllerState::for_session(ViewerRole::Admin, &session),
            ControllerState::OpenLocked {
                owner: "Admin Tan".to_string()
            }
        );
    }

    #[test]
    fn locked_details_without_owner_fall_back() {
        let body: ChatDetailsBody =
            decode_body(json!({ "status": "active", "is_locked": true })).unwrap();
        let session = body.into_session(&SessionId::from(7));
        assert_eq!(session.lock_owner.as_deref(), Some("another admin"));
    }

    #[test]
    fn unlocked_details_leave_the_chat_open() {
        let body: ChatDetailsBody = decode_body(json!({
            "user_name": "Mei Ling",
            "status": "closed",
            "is_locked": false,
            "locked_by_admin": "Admin Tan"
        }))
        .unwrap();
        let session = body.into_session(&SessionId::from(7));

        assert!(session.lock_owner.is_none());
        assert_eq!(session.status, SessionStatus::Closed);
    }

    #[test]
    fn user_session_comes_from_the_message_page() {
        let id = SessionId::from(9);
        let body: MessagesBody =
            decode_body(json!({ "messages": [], "admin_connected": false, "status": "active" }))
                .unwrap();
        let page = body.into_page(&id);
        let session = user_session(&id, &page);

        assert_eq!(session.id, id);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(!session.admin_connected);
        assert_eq!(
            ControllerState::for_session(ViewerRole::User, &session),
            ControllerState::OpenWaiting
        );

        let closed = MessagesBody {
            messages: Vec::new(),
            admin_connected: Some(true),
            status: Some(SessionStatus::Closed),
        }
        .into_page(&id);
        let session = user_session(&id, &closed);
        assert_eq!(session.status, SessionStatus::Closed);
        assert!(session.admin_connected);
    }

    #[test]
    fn error_statuses_are_classified() {
        assert!(check_response(StatusCode::OK, "OK").is_ok());
        assert!(check_response(StatusCode::OK, r#"{"status": "sent"}"#).is_ok());

        let reason = |status, text| match check_response(status, text) {
            Err(ChatError::Server(reason)) => reason,
            other => panic!("expected a server error, got {other:?}"),
        };
        assert_eq!(
            reason(StatusCode::NOT_FOUND, r#"{"error": "Chat session not found"}"#),
            "Chat session not found"
        );
        assert_eq!(
            reason(StatusCode::OK, r#"{"error": "Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(
            reason(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "server responded with 502 Bad Gateway"
        );
    }

    #[tokio::test]
    async fn admin_only_calls_are_refused_for_users() {
        let user = transport(ViewerRole::User);
        let result = user.close_session(&SessionId::from(1)).await;
        assert!(matches!(result, Err(ChatError::AdminOnly(_))));
    }
}
