use eframe::egui;
use egui::RichText;

use crate::model::game_state::GameStateSnapshot;
use crate::ui::app::UiIntent;
use crate::ui::{theme, view};

pub fn draw_left_panel(
    ctx: &egui::Context,
    snapshot: &GameStateSnapshot,
    intents: &mut Vec<UiIntent>,
) {
    egui::SidePanel::left("left")
        .resizable(true)
        .default_width(280.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::CollapsingHeader::new("Commander")
                    .default_open(true)
                    .show(ui, |ui| draw_character(ui, snapshot, intents));

                egui::CollapsingHeader::new("Faction relations")
                    .default_open(true)
                    .show(ui, |ui| draw_factions(ui, snapshot));

                egui::CollapsingHeader::new("Habitat")
                    .default_open(true)
                    .show(ui, |ui| draw_habitat(ui, snapshot, intents));
            });
        });
}

/* =========================
   Commander
   ========================= */

fn draw_character(ui: &mut egui::Ui, snapshot: &GameStateSnapshot, intents: &mut Vec<UiIntent>) {
    let Some(c) = view::character(snapshot) else {
        ui.label("Commander data not available.");
        return;
    };

    ui.horizontal(|ui| {
        ui.strong(&c.name);
        ui.label(&c.level);
    });

    ui.add(egui::ProgressBar::new(c.xp_fraction).text(format!("XP {}", c.xp)));

    ui.separator();
    let can_spend = c.attribute_points > 0;
    egui::Grid::new("attributes").num_columns(3).show(ui, |ui| {
        for attr in &c.attributes {
            ui.label(format!("{}:", attr.label));
            ui.label(&attr.value);
            if can_spend && ui.small_button("+").on_hover_text("Spend an attribute point").clicked() {
                intents.push(UiIntent::SpendAttributePoint(attr.key.clone()));
            }
            ui.end_row();
        }
    });
    ui.label(format!(
        "Attribute points: {}   Bonus points: {}",
        c.attribute_points, c.bonus_points
    ));

    ui.separator();
    ui.label(RichText::new("Active bonuses").strong());
    if c.active_bonuses.is_empty() {
        ui.label("No active bonuses.");
    }
    for bonus in &c.active_bonuses {
        ui.label(format!("★ {}", bonus.name)).on_hover_text(&bonus.description);
    }

    if c.bonus_points > 0 && !c.offered_bonuses.is_empty() {
        ui.separator();
        ui.label(RichText::new("Available bonuses").strong());
        for offer in &c.offered_bonuses {
            ui.horizontal(|ui| {
                ui.label(&offer.name).on_hover_text(&offer.description);
                if let Some(cost) = &offer.cost {
                    ui.weak(cost);
                }
                if ui.small_button("Acquire").clicked() {
                    intents.push(UiIntent::AcquireBonus(offer.id.clone()));
                }
            });
        }
    }
}

fn draw_factions(ui: &mut egui::Ui, snapshot: &GameStateSnapshot) {
    let rows = view::faction_relations(snapshot);
    if rows.is_empty() {
        ui.label("Faction data not available.");
        return;
    }

    for row in rows {
        ui.horizontal(|ui| {
            ui.label(&row.name);
            ui.label(
                RichText::new(row.standing.label()).color(theme::standing_color(row.standing)),
            );
        });
    }
}

/* =========================
   Habitat
   ========================= */

fn draw_habitat(ui: &mut egui::Ui, snapshot: &GameStateSnapshot, intents: &mut Vec<UiIntent>) {
    let habitat = view::habitat(snapshot);

    ui.label(format!("Population: {}", habitat.population));
    ui.separator();

    ui.label(RichText::new("Installed buildings").strong());
    if habitat.installed.is_empty() {
        ui.label("No buildings in the habitat.");
    }
    for row in &habitat.installed {
        ui.horizontal(|ui| {
            ui.label(format!("{} {}", row.glyph, row.label));
            if ui.small_button("⬆ Upgrade").clicked() {
                intents.push(UiIntent::Upgrade(row.blueprint_id.clone()));
            }
        });
    }

    ui.separator();
    ui.label(RichText::new("Habitat report").strong());
    ui.label(&habitat.report);

    ui.separator();
    ui.label(RichText::new("Construction").strong());
    if habitat.buildable.is_empty() {
        ui.label("No new construction unlocked.");
    }
    for row in &habitat.buildable {
        ui.horizontal(|ui| {
            ui.label(format!("{} {}", row.glyph, row.name));
            ui.weak(&row.cost);
            if ui
                .small_button("＋ Build")
                .on_hover_text("Builds on the selected hex")
                .clicked()
            {
                intents.push(UiIntent::Build(row.id.clone()));
            }
        });
    }
}
