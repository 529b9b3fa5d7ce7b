use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use skillswap_chat::common::{ChatCommand, ChatEvent, ViewerRole};
use skillswap_chat::render::time::DisplayClock;

use super::components::{chat_area, input_bar, sidebar, toast};
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    clock: DisplayClock,
    command_sender: mpsc::Sender<ChatCommand>,
    event_receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        role: ViewerRole,
        offset_hours: i32,
        command_sender: mpsc::Sender<ChatCommand>,
        event_receiver: mpsc::Receiver<ChatEvent>,
    ) -> Self {
        Self {
            state: AppState::new(role),
            clock: DisplayClock::new(offset_hours, role == ViewerRole::Admin),
            command_sender,
            event_receiver,
        }
    }

    fn handle_chat_events(&mut self) {
        let mut refresh_history = false;
        while let Ok(event) = self.event_receiver.try_recv() {
            refresh_history |= self.state.apply(event);
        }
        // Chat history is a user-view endpoint; admin resyncs skip it.
        if refresh_history && self.state.role == ViewerRole::User {
            self.send_command(ChatCommand::LoadHistory);
        }
    }

    fn send_command(&mut self, command: ChatCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to chat controller: {err}");
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_chat_events();
        self.state.expire_toasts(Instant::now());

        let actions = egui::SidePanel::left("chat_sidebar")
            .show(ctx, |ui| sidebar::render(ui, &mut self.state, &self.clock))
            .inner;
        if actions.start_chat {
            self.send_command(ChatCommand::StartChat);
        }
        if let Some(id) = actions.open {
            self.send_command(ChatCommand::OpenSession(id));
        }
        if actions.close_view {
            self.send_command(ChatCommand::Teardown);
        }
        if actions.refresh_history {
            self.send_command(ChatCommand::LoadHistory);
        }

        let input = egui::TopBottomPanel::bottom("chat_input")
            .show(ctx, |ui| {
                ui.add_space(4.0);
                let actions = input_bar::render(ui, &self.state.input, &mut self.state.input_text);
                ui.add_space(4.0);
                actions
            })
            .inner;
        if let Some(text) = input.send {
            self.send_command(ChatCommand::SendMessage(text));
        }
        if input.close {
            self.send_command(ChatCommand::CloseSession);
        }
        if input.reopen {
            self.send_command(ChatCommand::ReopenSession);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.state.title());
            ui.separator();
            if let Some(banner) = &self.state.input.banner {
                chat_area::render_banner(ui, banner);
                ui.add_space(4.0);
            }
            chat_area::render(ui, &self.state.thread, self.state.role);
        });

        toast::render(ctx, &self.state.toasts);
        if let Some(text) = self.state.alert.clone() {
            if toast::render_alert(ctx, &text) {
                self.state.alert = None;
            }
        }

        // Poll results arrive without user input.
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
