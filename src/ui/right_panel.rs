use eframe::egui;
use egui::RichText;

use crate::model::game_state::GameStateSnapshot;
use crate::model::message::Message;
use crate::ui::app::UiIntent;
use crate::ui::view::{self, TechAction};
use crate::ui::theme;

pub fn draw_right_panel(
    ctx: &egui::Context,
    snapshot: &GameStateSnapshot,
    system_log: &[String],
    intents: &mut Vec<UiIntent>,
) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(340.0)
        .min_width(260.0)
        .show(ctx, |ui| {
            egui::CollapsingHeader::new("Research")
                .default_open(true)
                .show(ui, |ui| draw_research(ui, snapshot, intents));

            ui.separator();
            ui.heading("Event log");
            egui::ScrollArea::vertical()
                .id_salt("event_log")
                .show(ui, |ui| draw_event_log(ui, snapshot, system_log));
        });
}

fn draw_research(ui: &mut egui::Ui, snapshot: &GameStateSnapshot, intents: &mut Vec<UiIntent>) {
    let research = view::research(snapshot);

    ui.label(format!("RP production: {}", research.rp_total));

    match &research.current {
        Some(current) => {
            ui.label(format!("Researching: {}", current.name));
            ui.add(egui::ProgressBar::new(current.fraction).text(&current.progress));
            if ui.small_button("✖ Cancel").clicked() {
                intents.push(UiIntent::CancelResearch(current.tech_id.clone()));
            }
        }
        None => {
            ui.label("No active research.");
        }
    }

    ui.separator();
    if research.techs.is_empty() {
        ui.label("No technologies available or researched.");
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt("techs")
        .max_height(260.0)
        .show(ui, |ui| {
            for tech in &research.techs {
                ui.horizontal_wrapped(|ui| {
                    ui.label(format!("{} {}", tech.glyph, tech.title))
                        .on_hover_text(&tech.description);
                    ui.weak(&tech.cost);
                    match tech.action {
                        TechAction::Research => {
                            if ui.small_button("▶ Research").clicked() {
                                intents.push(UiIntent::StartResearch(tech.id.clone()));
                            }
                        }
                        TechAction::InProgress => {
                            ui.label(RichText::new("(in progress...)").italics());
                        }
                        TechAction::None => {}
                    }
                });
            }
        });
}

fn draw_event_log(ui: &mut egui::Ui, snapshot: &GameStateSnapshot, system_log: &[String]) {
    let log = view::event_log(snapshot, system_log);
    if log.is_empty() {
        ui.label("No events recorded.");
        return;
    }

    for msg in &log {
        let prefix_color = match msg {
            Message::System(_) => theme::HEX_OWNED,
            Message::Event { .. } => theme::MUTED,
        };
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(msg.prefix()).color(prefix_color));
            ui.label(msg.text());
        });
    }
}
