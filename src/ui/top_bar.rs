use eframe::egui;
use egui::{Align, Layout, RichText};

use crate::model::game_state::GameStateSnapshot;
use crate::model::message::Notice;
use crate::ui::app::UiIntent;
use crate::ui::settings::UiSettings;
use crate::ui::{theme, view};

pub fn draw_top_bar(
    ctx: &egui::Context,
    snapshot: &GameStateSnapshot,
    notice: Option<&Notice>,
    advancing: bool,
    settings: &mut UiSettings,
    intents: &mut Vec<UiIntent>,
) {
    let header = view::header(snapshot);
    let bar = view::resource_bar(snapshot);

    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Chronica Martis");
            ui.label(&header.title);
            ui.separator();
            ui.label(format!("Year: {}", header.year));
            ui.label(format!("Turn: {}", header.turn));

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let label = if advancing { "Advancing..." } else { "Next turn ▶" };
                if ui.add_enabled(!advancing, egui::Button::new(label)).clicked() {
                    intents.push(UiIntent::AdvanceTurn);
                }

                ui.menu_button("⚙", |ui| {
                    ui.label("UI scale");
                    ui.add(egui::Slider::new(&mut settings.ui_scale, 0.75..=2.0));
                    ui.label("Notice duration (s)");
                    ui.add(egui::Slider::new(&mut settings.notice_seconds, 1.0..=30.0));
                });
            });
        });

        ui.horizontal_wrapped(|ui| {
            for entry in &bar.entries {
                ui.label(
                    RichText::new(format!("{} {}", entry.glyph, entry.label))
                        .color(theme::trend_color(entry.trend)),
                )
                .on_hover_text(&entry.key);
            }
            ui.label(RichText::new(format!("🔬 {}", bar.research)).color(theme::POSITIVE))
                .on_hover_text("Research point production");
        });

        if let Some(notice) = notice {
            draw_notice(ui, notice);
        }
    });

    egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("💾 Save").clicked() {
                intents.push(UiIntent::SaveLocally);
            }
            if ui.button("⟳ Sync").on_hover_text("Fetch the full state again").clicked() {
                intents.push(UiIntent::Resync);
            }
        });
    });
}

pub fn draw_notice(ui: &mut egui::Ui, notice: &Notice) {
    egui::Frame::new()
        .fill(theme::notice_fill(notice.kind))
        .corner_radius(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::symmetric(10, 4))
        .show(ui, |ui| {
            ui.label(RichText::new(&notice.text).color(egui::Color32::WHITE));
        });
}
