use eframe::egui;
use egui::{Align2, FontId, Sense, Shape, Stroke};

use crate::model::game_state::GameStateSnapshot;
use crate::model::selection::Selection;
use crate::ui::app::UiIntent;
use crate::ui::hex_geometry::{axial_to_pixel, hexagon, map_origin, sprite_size, HexHitMap};
use crate::ui::settings::{MAX_ZOOM, MIN_ZOOM};
use crate::ui::view::{self, HexPanelView};
use crate::ui::theme;

pub fn draw_center_panel(
    ctx: &egui::Context,
    snapshot: &GameStateSnapshot,
    selection: &Selection,
    hits: &mut HexHitMap,
    zoom: &mut f32,
    intents: &mut Vec<UiIntent>,
) {
    egui::TopBottomPanel::bottom("hex_details")
        .resizable(true)
        .default_height(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("hex_details_scroll")
                .show(ui, |ui| draw_hex_details(ui, snapshot, selection, intents));
        });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(view::location_label(selection.selected()));
            ui.add(egui::Slider::new(&mut *zoom, MIN_ZOOM..=MAX_ZOOM).text("Zoom"));
        });
        ui.separator();
        draw_map(ui, snapshot, selection, hits, *zoom, intents);
    });
}

/* =========================
   Map
   ========================= */

fn draw_map(
    ui: &mut egui::Ui,
    snapshot: &GameStateSnapshot,
    selection: &Selection,
    hits: &mut HexHitMap,
    zoom: f32,
    intents: &mut Vec<UiIntent>,
) {
    // rebuilt every pass; stale outlines must never resolve
    hits.clear();

    let cells = view::map_cells(snapshot, selection);
    if cells.is_empty() {
        ui.centered_and_justified(|ui| {
            ui.label("Map data not available or empty.");
        });
        return;
    }

    let sprite = sprite_size(zoom);
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
    let origin = response.rect.min + map_origin(response.rect.size(), sprite);

    for cell in &cells {
        let top_left = origin + axial_to_pixel(cell.coord, sprite).to_vec2();
        let outline = hexagon(top_left, sprite);

        let stroke = if cell.selected {
            Stroke::new(3.0, theme::HEX_SELECTED)
        } else if cell.player_owned {
            Stroke::new(2.0, theme::HEX_OWNED)
        } else {
            Stroke::new(1.0, theme::HEX_EDGE)
        };
        painter.add(Shape::convex_polygon(
            outline.to_vec(),
            theme::terrain_color(cell.terrain.as_deref()),
            stroke,
        ));

        let center = top_left + sprite / 2.0;
        if let Some(glyph) = cell.glyph {
            painter.text(
                center,
                Align2::CENTER_CENTER,
                glyph,
                FontId::proportional(40.0 * zoom),
                egui::Color32::WHITE,
            );
        }
        if cell.start_hex {
            painter.circle_stroke(center, sprite.y * 0.42, Stroke::new(1.0, theme::HEX_START));
        }

        hits.tag(cell.coord, outline);
    }

    if response.clicked() {
        if let Some(coord) = response.interact_pointer_pos().and_then(|p| hits.resolve(p)) {
            intents.push(UiIntent::SelectHex(coord));
        }
    }
    if response.secondary_clicked() {
        intents.push(UiIntent::Deselect);
    }

    let hovered = response
        .hover_pos()
        .and_then(|p| hits.resolve(p))
        .and_then(|coord| cells.iter().find(|c| c.coord == coord));
    if let Some(cell) = hovered {
        response.on_hover_text(&cell.tooltip);
    }
}

/* =========================
   Hex details
   ========================= */

fn draw_hex_details(
    ui: &mut egui::Ui,
    snapshot: &GameStateSnapshot,
    selection: &Selection,
    intents: &mut Vec<UiIntent>,
) {
    let details = match view::hex_details(snapshot, selection) {
        HexPanelView::NoSelection => {
            ui.weak("Select a hex to see its details.");
            return;
        }
        HexPanelView::Missing(coord) => {
            ui.colored_label(theme::NEGATIVE, format!("No data for hex {coord}!"));
            return;
        }
        HexPanelView::Details(details) => details,
    };

    ui.heading(format!("Hex {}", details.coord));
    egui::Grid::new("hex_details_grid").num_columns(2).show(ui, |ui| {
        ui.label("Terrain:");
        ui.label(&details.terrain);
        ui.end_row();

        ui.label("Resources:");
        ui.label(&details.resources);
        ui.end_row();

        ui.label("Building:");
        ui.label(&details.building);
        ui.end_row();

        ui.label("Owner:");
        ui.label(details.owner.label());
        ui.end_row();

        if let Some(poi) = &details.poi {
            ui.label("Point of interest:");
            ui.label(poi);
            ui.end_row();
        }

        ui.label("State:");
        ui.label(if details.explored { "Explored" } else { "Unexplored" });
        ui.end_row();
    });

    if details.can_explore && ui.button("🔍 Explore").clicked() {
        intents.push(UiIntent::Explore(details.coord));
    }

    ui.separator();
    ui.strong("Build here");
    match &details.construction {
        Err(block) => {
            ui.label(block.to_string());
        }
        Ok(rows) if rows.is_empty() => {
            ui.label("No building suits this hex, or nothing is unlocked yet.");
        }
        Ok(rows) => {
            for row in rows {
                ui.horizontal(|ui| {
                    ui.label(format!("{} {}", row.glyph, row.name));
                    ui.weak(&row.cost);
                    if ui.small_button("＋ Build").clicked() {
                        intents.push(UiIntent::Build(row.id.clone()));
                    }
                });
            }
        }
    }
}
