use eframe::egui;

use crate::ui::state::Toast;

pub fn render(ctx: &egui::Context, toasts: &[Toast]) {
    if toasts.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("chat_toasts"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -64.0))
        .show(ctx, |ui| {
            for toast in toasts {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(&toast.text);
                });
            }
        });
}

/// Modal báo lỗi. Returns true once dismissed.
pub fn render_alert(ctx: &egui::Context, text: &str) -> bool {
    let mut dismissed = false;
    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(text);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    dismissed
}
