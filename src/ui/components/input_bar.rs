use eframe::egui;

use skillswap_chat::common::{InputState, SessionAction};

#[derive(Default)]
pub struct InputActions {
    pub send: Option<String>,
    pub close: bool,
    pub reopen: bool,
}

pub fn render(ui: &mut egui::Ui, input: &InputState, input_text: &mut String) -> InputActions {
    let mut actions = InputActions::default();
    let mut send = false;

    ui.horizontal(|ui| {
        let response = ui.add_enabled(
            input.enabled,
            egui::TextEdit::singleline(input_text).hint_text(input.placeholder.as_str()),
        );
        if ui.add_enabled(input.enabled, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
        }

        match input.action {
            SessionAction::CloseChat => actions.close = ui.button("Close Chat").clicked(),
            SessionAction::ReopenChat => actions.reopen = ui.button("Reopen Chat").clicked(),
            SessionAction::None => {}
        }
    });

    // Nội dung rỗng vẫn gửi để controller báo lỗi
    if send && input.enabled {
        actions.send = Some(input_text.clone());
    }

    actions
}
