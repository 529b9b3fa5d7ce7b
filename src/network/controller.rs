use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::common::{
    ChatCommand, ChatError, ChatEvent, ChatMessage, ChatSession, ControllerState, InputState,
    MessagePage, SessionId, SessionStatus, UserAction, ViewerRole,
};
use crate::config::AppConfig;
use crate::render::{RenderedThread, Viewer, render_thread};

use super::poller::{PollTick, SessionPoller};
use super::transport::ChatTransport;

/// Owns one chat widget's session: which session is open, what state it is
/// in, the poll timer, and the last rendered thread. All mutation happens on
/// the task that drives [`ChatController::run`]; poll results arrive through
/// a channel and are checked against the current session id before use.
pub struct ChatController {
    role: ViewerRole,
    offset_hours: i32,
    transport: Arc<dyn ChatTransport>,
    poller: SessionPoller,
    state: ControllerState,
    session: Option<ChatSession>,
    thread: RenderedThread,
    event_sender: mpsc::Sender<ChatEvent>,
    tick_sender: mpsc::UnboundedSender<PollTick>,
    tick_receiver: mpsc::UnboundedReceiver<PollTick>,
}

impl ChatController {
    pub fn new(
        role: ViewerRole,
        transport: Arc<dyn ChatTransport>,
        poll_interval: Duration,
        offset_hours: i32,
        event_sender: mpsc::Sender<ChatEvent>,
    ) -> Self {
        let (tick_sender, tick_receiver) = mpsc::unbounded_channel();
        Self {
            role,
            offset_hours,
            poller: SessionPoller::new(Arc::clone(&transport), poll_interval),
            transport,
            state: ControllerState::Closed,
            session: None,
            thread: RenderedThread::Empty,
            event_sender,
            tick_sender,
            tick_receiver,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn ChatTransport>,
        event_sender: mpsc::Sender<ChatEvent>,
    ) -> Self {
        Self::new(
            config.role,
            transport,
            config.poll_interval(),
            config.display_offset_hours,
            event_sender,
        )
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|session| &session.id)
    }

    pub fn thread(&self) -> &RenderedThread {
        &self.thread
    }

    pub fn input_state(&self) -> InputState {
        InputState::for_state(self.role, &self.state)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Serves UI commands and poll results until the command channel closes,
    /// then tears the session down.
    pub async fn run(mut self, mut command_receiver: mpsc::Receiver<ChatCommand>) {
        log::info!("Chat controller started ({:?} view)", self.role);

        loop {
            tokio::select! {
                command = command_receiver.recv() => {
                    if let Some(command) = command {
                        self.handle_command(command).await;
                    } else {
                        break;
                    }
                }
                Some(tick) = self.tick_receiver.recv() => {
                    self.handle_tick(tick).await;
                }
            }
        }

        self.teardown().await;
        log::info!("Chat controller stopped");
    }

    pub async fn handle_command(&mut self, command: ChatCommand) {
        let result = match command {
            ChatCommand::StartChat => self.start_chat().await,
            ChatCommand::ResumeActive => self.resume_active().await,
            ChatCommand::OpenSession(id) => self.open_session(id).await,
            ChatCommand::SendMessage(text) => self.send_message(&text).await,
            ChatCommand::CloseSession => self.close_session().await,
            ChatCommand::ReopenSession => self.reopen_session().await,
            ChatCommand::Teardown => {
                self.teardown().await;
                Ok(())
            }
            ChatCommand::LoadHistory => self.load_history().await,
        };

        if let Err(err) = result {
            log::debug!("Chat command failed: {err}");
        }
    }

    /// Applies one poll result. Results for any session other than the
    /// current one are late arrivals and are dropped.
    pub async fn handle_tick(&mut self, tick: PollTick) {
        if self.session_id() != Some(&tick.session_id) {
            log::debug!("Discarding poll result for stale session {}", tick.session_id);
            return;
        }

        match tick.outcome {
            Ok(page) => self.apply_page(page).await,
            Err(reason) => {
                log::warn!("Server rejected poll for chat session {}: {reason}", tick.session_id);
            }
        }
    }

    pub async fn start_chat(&mut self) -> Result<(), ChatError> {
        if self.role != ViewerRole::User {
            return Err(ChatError::Validation(
                "Starting a chat is only available in the user view".to_string(),
            ));
        }

        match self.transport.start_chat().await {
            Ok(id) => {
                self.open_session(id).await?;
                // The new chat belongs in the history list.
                self.emit(ChatEvent::ResyncRequested).await;
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to start chat: {err}");
                self.emit(ChatEvent::Alert(err.alert_text(UserAction::StartChat)))
                    .await;
                Err(err)
            }
        }
    }

    /// Opens the session the server reports as the user's active one.
    pub async fn resume_active(&mut self) -> Result<(), ChatError> {
        match self.transport.active_session().await {
            Ok(Some(id)) => {
                if self.session_id() == Some(&id) && self.state.is_open() {
                    return Ok(());
                }
                self.open_session(id).await
            }
            Ok(None) => {
                log::debug!("No active chat session to resume");
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to look up active chat: {err}");
                Err(err)
            }
        }
    }

    pub async fn load_history(&mut self) -> Result<(), ChatError> {
        match self.transport.chat_history().await {
            Ok(chats) => {
                log::debug!("Loaded {} chat history entries", chats.len());
                self.emit(ChatEvent::HistoryLoaded(chats)).await;
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to load chat history: {err}");
                Err(err)
            }
        }
    }

    pub async fn open_session(&mut self, id: SessionId) -> Result<(), ChatError> {
        self.clear_session().await;
        self.set_state(ControllerState::Opening).await;
        log::info!("Opening chat session {id}");

        let snapshot = match self.transport.open_session(&id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("Failed to open chat session {id}: {err}");
                self.clear_session().await;
                self.set_state(ControllerState::Closed).await;
                self.emit(ChatEvent::Alert(err.alert_text(UserAction::LoadChat)))
                    .await;
                return Err(err);
            }
        };

        let state = ControllerState::for_session(self.role, &snapshot.session);
        self.session = Some(snapshot.session);
        self.set_state(state).await;
        self.render_messages(&snapshot.page.messages).await;
        self.start_polling(id);
        Ok(())
    }

    pub async fn send_message(&mut self, text: &str) -> Result<(), ChatError> {
        let Some(id) = self.session_id().cloned() else {
            return self
                .reject(ChatError::Validation("No chat session is open".to_string()))
                .await;
        };
        if self.state != ControllerState::OpenActive {
            log::debug!("Ignoring send while chat is {}", self.state.name());
            return Err(ChatError::InvalidState(self.state.name()));
        }

        let text = text.trim();
        if text.is_empty() {
            return self
                .reject(ChatError::Validation("Message cannot be empty".to_string()))
                .await;
        }

        match self.transport.send_message(&id, text).await {
            Ok(()) => {
                self.emit(ChatEvent::MessageSent).await;
                // Reload right away instead of waiting for the next tick.
                self.reload_messages().await;
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to send message to chat session {id}: {err}");
                self.emit(ChatEvent::Alert(err.alert_text(UserAction::SendMessage)))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn close_session(&mut self) -> Result<(), ChatError> {
        let id = self.admin_session("Closing a chat")?;
        if self.state != ControllerState::OpenActive {
            return Err(ChatError::InvalidState(self.state.name()));
        }

        if let Err(err) = self.transport.close_session(&id).await {
            log::warn!("Failed to close chat session {id}: {err}");
            self.emit(ChatEvent::Alert(err.alert_text(UserAction::CloseChat)))
                .await;
            return Err(err);
        }

        log::info!("Closed chat session {id}");
        self.update_status(SessionStatus::Closed).await;
        self.resync(&id).await;
        Ok(())
    }

    pub async fn reopen_session(&mut self) -> Result<(), ChatError> {
        let id = self.admin_session("Reopening a chat")?;
        if self.state != ControllerState::OpenClosed {
            return Err(ChatError::InvalidState(self.state.name()));
        }

        if let Err(err) = self.transport.reopen_session(&id).await {
            log::warn!("Failed to reopen chat session {id}: {err}");
            self.emit(ChatEvent::Alert(err.alert_text(UserAction::ReopenChat)))
                .await;
            return Err(err);
        }

        log::info!("Reopened chat session {id}");
        self.update_status(SessionStatus::Active).await;
        self.resync(&id).await;
        Ok(())
    }

    /// Stops polling and forgets everything about the current session.
    pub async fn teardown(&mut self) {
        if let Some(id) = self.session_id() {
            log::info!("Closing chat view for session {id}");
        }
        self.clear_session().await;
        self.state = ControllerState::Closed;
        self.emit(self.state_event()).await;
    }

    fn admin_session(&self, operation: &'static str) -> Result<SessionId, ChatError> {
        if self.role != ViewerRole::Admin {
            return Err(ChatError::AdminOnly(operation));
        }
        self.session_id()
            .cloned()
            .ok_or_else(|| ChatError::Validation("No chat session is open".to_string()))
    }

    async fn reject(&self, err: ChatError) -> Result<(), ChatError> {
        self.emit(ChatEvent::Notice(err.to_string())).await;
        Err(err)
    }

    fn reset_session(&mut self) {
        self.poller.stop();
        self.session = None;
        self.thread = RenderedThread::Empty;
        // Ticks already queued belong to the old session.
        while self.tick_receiver.try_recv().is_ok() {}
    }

    /// Like [`Self::reset_session`], and tells the UI to drop the old thread.
    async fn clear_session(&mut self) {
        self.reset_session();
        self.emit(ChatEvent::ThreadRendered(RenderedThread::Empty))
            .await;
    }

    fn start_polling(&mut self, id: SessionId) {
        let ticks = self.tick_sender.clone();
        self.poller.start(id, move |tick| {
            if ticks.send(tick).is_err() {
                log::debug!("Chat controller gone; dropping poll result");
            }
        });
    }

    async fn reload_messages(&mut self) {
        let Some(id) = self.session_id().cloned() else {
            return;
        };
        match self.transport.fetch_messages(&id).await {
            Ok(page) => self.apply_page(page).await,
            Err(err) => log::warn!("Failed to reload chat session {id}: {err}"),
        }
    }

    /// Re-fetches the open session after a status change so every view of
    /// it agrees with the server. Keeps the session id and the poller.
    async fn resync(&mut self, id: &SessionId) {
        match self.transport.open_session(id).await {
            Ok(snapshot) if self.session_id() == Some(&snapshot.session.id) => {
                self.session = Some(snapshot.session);
                self.refresh_state().await;
                self.render_messages(&snapshot.page.messages).await;
            }
            Ok(snapshot) => {
                log::debug!("Discarding resync for stale session {}", snapshot.session.id);
            }
            Err(err) => log::warn!("Failed to resync chat session {id}: {err}"),
        }
        self.emit(ChatEvent::ResyncRequested).await;
    }

    async fn apply_page(&mut self, page: MessagePage) {
        let admin_joined = {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            if session.id != page.session_id {
                log::debug!("Discarding messages for stale session {}", page.session_id);
                return;
            }

            let was_connected = session.admin_connected;
            if let Some(status) = page.status {
                session.status = status;
            }
            if let Some(connected) = page.admin_connected {
                session.admin_connected = connected;
            }
            self.role == ViewerRole::User && !was_connected && session.admin_connected
        };

        self.refresh_state().await;
        if admin_joined {
            log::info!("An admin joined chat session {}", page.session_id);
            self.emit(ChatEvent::AdminConnected).await;
        }
        self.render_messages(&page.messages).await;
    }

    async fn update_status(&mut self, status: SessionStatus) {
        if let Some(session) = self.session.as_mut() {
            session.status = status;
        }
        self.refresh_state().await;
    }

    async fn refresh_state(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let next = ControllerState::for_session(self.role, session);
        if next != self.state {
            self.set_state(next).await;
        }
    }

    async fn set_state(&mut self, state: ControllerState) {
        log::debug!("Chat state {} -> {}", self.state.name(), state.name());
        self.state = state;
        self.emit(self.state_event()).await;
    }

    /// Replaces the whole rendered thread.
    async fn render_messages(&mut self, messages: &[ChatMessage]) {
        let participant = self
            .session
            .as_ref()
            .and_then(|session| session.participant.clone());
        let viewer = Viewer::new(self.role, self.offset_hours).with_participant(participant);
        self.thread = render_thread(messages, &viewer, Utc::now());
        self.emit(ChatEvent::ThreadRendered(self.thread.clone()))
            .await;
    }

    fn state_event(&self) -> ChatEvent {
        ChatEvent::StateChanged {
            state: self.state.clone(),
            input: self.input_state(),
            session: self.session.clone(),
        }
    }

    async fn emit(&self, event: ChatEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify UI: {err}");
        }
    }
}
