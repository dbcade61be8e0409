use eframe::egui;
use egui::RichText;

use crate::engine::protocol::{ATTRIBUTE_MAX, ATTRIBUTE_MIN, CUSTOM_ATTRIBUTE_POINTS};
use crate::model::catalog::Catalog;
use crate::model::message::Notice;
use crate::ui::app::{LandingState, UiIntent};
use crate::ui::{theme, top_bar};

pub fn draw_landing(
    ctx: &egui::Context,
    state: &mut LandingState,
    catalog: &Catalog,
    save_available: bool,
    busy: bool,
    notice: Option<&Notice>,
    intents: &mut Vec<UiIntent>,
) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.heading(RichText::new("Chronica Martis").size(32.0));
            ui.label("Found a colony. Survive the red planet.");
            ui.add_space(8.0);

            if let Some(notice) = notice {
                top_bar::draw_notice(ui, notice);
            }
            ui.add_space(12.0);

            let hint = if save_available {
                "Load the last game saved locally"
            } else {
                "No game saved locally"
            };
            if ui
                .add_enabled(save_available && !busy, egui::Button::new("▶ Continue"))
                .on_hover_text(hint)
                .on_disabled_hover_text(hint)
                .clicked()
            {
                intents.push(UiIntent::ContinueSaved);
            }
        });

        ui.add_space(16.0);
        ui.separator();
        ui.heading("New game");
        draw_setup_form(ui, state, catalog);

        if ui
            .add_enabled(!busy, egui::Button::new("🚀 Start colonization"))
            .clicked()
        {
            intents.push(UiIntent::StartGame);
        }

        ui.add_space(16.0);
        ui.separator();
        ui.collapsing("Developer", |ui| draw_reset(ui, state, busy, intents));
    });
}

fn draw_setup_form(ui: &mut egui::Ui, state: &mut LandingState, catalog: &Catalog) {
    egui::Grid::new("setup_form").num_columns(2).show(ui, |ui| {
        ui.label("Game name");
        ui.text_edit_singleline(&mut state.player_name);
        ui.end_row();

        ui.label("Faction");
        let faction = catalog.faction(&state.faction_id);
        let combo = egui::ComboBox::from_id_salt("setup_faction")
            .width(260.0)
            .selected_text(faction.map_or("Choose a faction", |f| f.name.as_str()))
            .show_ui(ui, |ui| {
                for f in &catalog.factions {
                    ui.selectable_value(&mut state.faction_id, f.id.clone(), f.name.as_str());
                }
            });
        if let Some(description) = faction.and_then(|f| f.description.as_deref()) {
            combo.response.on_hover_text(description);
        }
        ui.end_row();

        ui.label("Commander");
        ui.horizontal(|ui| {
            ui.radio_value(&mut state.custom_character, false, "Predefined");
            ui.radio_value(&mut state.custom_character, true, "Custom");
        });
        ui.end_row();

        if !state.custom_character {
            ui.label("Character");
            egui::ComboBox::from_id_salt("setup_character")
                .width(260.0)
                .selected_text(
                    catalog
                        .predefined(&state.predefined_id)
                        .map_or("Choose a commander", |c| c.name.as_str()),
                )
                .show_ui(ui, |ui| {
                    for c in &catalog.predefined_characters {
                        ui.selectable_value(&mut state.predefined_id, c.id.clone(), c.name.as_str());
                    }
                });
            ui.end_row();
        }
    });

    if state.custom_character {
        draw_custom_commander(ui, state, catalog);
    } else if let Some(c) = catalog.predefined(&state.predefined_id) {
        let attributes = catalog
            .attributes
            .iter()
            .map(|a| {
                let value = c.attributes.get(&a.key).copied().unwrap_or(ATTRIBUTE_MIN);
                format!("{} {value}", a.display_name)
            })
            .collect::<Vec<_>>()
            .join(" · ");
        ui.label(RichText::new(attributes).small());
        if let Some(bonus) = catalog.bonus(&c.starting_bonus_id) {
            ui.label(RichText::new(format!("Starting bonus: {}", bonus.name)).small())
                .on_hover_text(bonus.description.as_deref().unwrap_or_default());
        }
    }
}

fn draw_custom_commander(ui: &mut egui::Ui, state: &mut LandingState, catalog: &Catalog) {
    let custom = &mut state.custom;
    egui::Grid::new("custom_commander").num_columns(2).show(ui, |ui| {
        ui.label("Commander name");
        ui.text_edit_singleline(&mut custom.name);
        ui.end_row();

        for a in &catalog.attributes {
            ui.label(a.display_name.as_str());
            let value = custom.attributes.entry(a.key.clone()).or_insert(ATTRIBUTE_MIN);
            ui.add(egui::Slider::new(value, ATTRIBUTE_MIN..=ATTRIBUTE_MAX));
            ui.end_row();
        }

        ui.label("Starting bonus");
        egui::ComboBox::from_id_salt("setup_bonus")
            .width(260.0)
            .selected_text(
                catalog
                    .bonus(&custom.bonus_id)
                    .map_or("Choose a bonus", |b| b.name.as_str()),
            )
            .show_ui(ui, |ui| {
                for b in catalog.starting_bonuses() {
                    ui.selectable_value(&mut custom.bonus_id, b.id.clone(), b.name.as_str())
                        .on_hover_text(b.description.as_deref().unwrap_or_default());
                }
            });
        ui.end_row();
    });

    let spent = custom.points_spent();
    let color = if spent == CUSTOM_ATTRIBUTE_POINTS {
        theme::POSITIVE
    } else {
        theme::NEGATIVE
    };
    ui.colored_label(
        color,
        format!("Attribute points used: {spent} / {CUSTOM_ATTRIBUTE_POINTS}"),
    );
}

fn draw_reset(ui: &mut egui::Ui, state: &mut LandingState, busy: bool, intents: &mut Vec<UiIntent>) {
    if !state.confirm_reset {
        if ui
            .add_enabled(!busy, egui::Button::new("Reset server game state"))
            .clicked()
        {
            state.confirm_reset = true;
        }
        return;
    }

    ui.colored_label(
        theme::NEGATIVE,
        "This resets the global game on the server for every connected player. It cannot be undone.",
    );
    ui.horizontal(|ui| {
        if ui.button("Confirm reset").clicked() {
            intents.push(UiIntent::ResetServer);
        }
        if ui.button("Cancel").clicked() {
            state.confirm_reset = false;
        }
    });
}
