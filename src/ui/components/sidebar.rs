use chrono::Utc;
use eframe::egui;

use skillswap_chat::common::{SessionId, ViewerRole};
use skillswap_chat::render::history::{ChatFilter, render_history};
use skillswap_chat::render::time::DisplayClock;

use crate::ui::state::AppState;

#[derive(Default)]
pub struct SidebarActions {
    pub open: Option<SessionId>,
    pub start_chat: bool,
    pub refresh_history: bool,
    pub close_view: bool,
}

pub fn render(ui: &mut egui::Ui, state: &mut AppState, clock: &DisplayClock) -> SidebarActions {
    let mut actions = SidebarActions::default();

    match state.role {
        ViewerRole::User => {
            ui.heading("My Chats");
            ui.separator();
            if ui.button("Start Chat").clicked() {
                actions.start_chat = true;
            }
        }
        ViewerRole::Admin => {
            ui.heading("Live Chat");
            ui.separator();
            ui.label("Open session:");
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut state.session_id_input);
                if ui.button("Open").clicked() {
                    match state.session_id_input.parse::<SessionId>() {
                        Ok(id) => {
                            actions.open = Some(id);
                            state.session_id_input.clear();
                        }
                        Err(err) => log::debug!("Ignoring session id input: {err}"),
                    }
                }
            });
        }
    }

    if state.session.is_some() && ui.button("Close View").clicked() {
        actions.close_view = true;
    }

    if state.role == ViewerRole::Admin {
        return actions;
    }

    ui.separator();
    ui.horizontal(|ui| {
        for filter in ChatFilter::ALL {
            ui.selectable_value(&mut state.filter, filter, filter.label());
        }
        if ui.small_button("⟳").clicked() {
            actions.refresh_history = true;
        }
    });

    let rows = render_history(&state.history, state.filter, clock, Utc::now());
    if rows.is_empty() {
        ui.label("No chats found");
        return actions;
    }

    let current = state.session.as_ref().map(|session| &session.id);
    egui::ScrollArea::vertical().show(ui, |ui| {
        for row in rows {
            let selected = current == Some(&row.session_id);
            let response = ui
                .group(|ui| {
                    ui.horizontal(|ui| {
                        let color = if row.ongoing {
                            egui::Color32::GREEN
                        } else {
                            egui::Color32::GRAY
                        };
                        ui.colored_label(color, "●");
                        ui.label(egui::RichText::new(format!("#{}", row.session_id)).strong());
                        ui.label(egui::RichText::new(row.status_label).weak());
                    });
                    ui.label(&row.preview);
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(&row.time_label).small().weak());
                        ui.label(egui::RichText::new(&row.count_label).small().weak());
                    });
                })
                .response
                .interact(egui::Sense::click());

            if response.clicked() && !selected {
                actions.open = Some(row.session_id.clone());
            }
        }
    });

    actions
}
