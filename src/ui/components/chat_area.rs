use eframe::egui;

use skillswap_chat::common::{Banner, BannerKind, SenderRole, ViewerRole};
use skillswap_chat::render::{EMPTY_THREAD_TEXT, RenderedThread};

fn banner_color(kind: &BannerKind) -> egui::Color32 {
    match kind {
        BannerKind::Info => egui::Color32::LIGHT_BLUE,
        BannerKind::Warning => egui::Color32::YELLOW,
        BannerKind::Danger => egui::Color32::LIGHT_RED,
    }
}

pub fn render_banner(ui: &mut egui::Ui, banner: &Banner) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.colored_label(banner_color(&banner.kind), egui::RichText::new(&banner.title).strong());
        if let Some(detail) = &banner.detail {
            ui.label(egui::RichText::new(detail).weak());
        }
    });
}

pub fn render(ui: &mut egui::Ui, thread: &RenderedThread, role: ViewerRole) {
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if thread.is_empty() {
                ui.label(egui::RichText::new(EMPTY_THREAD_TEXT).weak().italics());
                return;
            }

            for message in thread.messages() {
                // Tin nhắn của chính mình căn phải
                let own = message.sender.is_viewer(role);
                let layout = if own {
                    egui::Layout::top_down(egui::Align::Max)
                } else {
                    egui::Layout::top_down(egui::Align::Min)
                };

                ui.with_layout(layout, |ui| {
                    let name = egui::RichText::new(&message.sender_label).strong();
                    let name = match message.sender {
                        SenderRole::System => name.italics(),
                        _ => name,
                    };
                    ui.label(name);
                    ui.label(&message.text);
                    ui.label(egui::RichText::new(&message.time_label).small().weak());
                });
                ui.add_space(6.0);
            }
        });
}
