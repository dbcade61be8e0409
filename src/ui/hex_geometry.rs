use egui::{pos2, Pos2, Vec2};

use crate::model::game_state::HexCoord;

/// Top-left corner of a hex sprite, in map-local pixels.
pub type PixelPos = Pos2;

pub const HEX_GFX_WIDTH: f32 = 150.0;
pub const HEX_GFX_HEIGHT: f32 = 160.0;
pub const HEX_GFX: Vec2 = Vec2::new(HEX_GFX_WIDTH, HEX_GFX_HEIGHT);

/// Columns overlap by a quarter sprite width.
const HORIZ_SPACING: f32 = 0.75;
/// Odd columns drop half a sprite to interlock.
const ODD_COLUMN_SHIFT: f32 = 0.5;

pub fn sprite_size(zoom: f32) -> Vec2 {
    HEX_GFX * zoom
}

pub fn axial_to_pixel(coord: HexCoord, sprite: Vec2) -> PixelPos {
    let x = coord.q as f32 * sprite.x * HORIZ_SPACING;
    let shift = if coord.q % 2 != 0 {
        sprite.y * ODD_COLUMN_SHIFT
    } else {
        0.0
    };
    let y = coord.r as f32 * sprite.y + shift;
    pos2(x, y)
}

/// Offset that puts the origin hex in the middle of the container.
pub fn map_origin(container: Vec2, sprite: Vec2) -> Vec2 {
    container / 2.0 - sprite / 2.0
}

/// Flat-top hexagon inscribed in the sprite rectangle, clockwise on screen.
pub fn hexagon(top_left: Pos2, sprite: Vec2) -> [Pos2; 6] {
    let (x, y, w, h) = (top_left.x, top_left.y, sprite.x, sprite.y);
    [
        pos2(x + 0.25 * w, y),
        pos2(x + 0.75 * w, y),
        pos2(x + w, y + 0.5 * h),
        pos2(x + 0.75 * w, y + h),
        pos2(x + 0.25 * w, y + h),
        pos2(x, y + 0.5 * h),
    ]
}

fn convex_contains(outline: &[Pos2; 6], p: Pos2) -> bool {
    let mut sign = 0.0_f32;
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[(i + 1) % outline.len()];
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Cells painted this frame, in paint order. Resolves pointer positions
/// back to coordinates without inverting the layout math.
#[derive(Debug, Default)]
pub struct HexHitMap {
    cells: Vec<(HexCoord, [Pos2; 6])>,
}

impl HexHitMap {
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn tag(&mut self, coord: HexCoord, outline: [Pos2; 6]) {
        self.cells.push((coord, outline));
    }

    /// Topmost (last painted) cell under `p`.
    pub fn resolve(&self, p: Pos2) -> Option<HexCoord> {
        self.cells
            .iter()
            .rev()
            .find(|(_, outline)| convex_contains(outline, p))
            .map(|(coord, _)| *coord)
    }

    pub fn is_tagged(&self, coord: HexCoord) -> bool {
        self.cells.iter().any(|(c, _)| *c == coord)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    #[test]
    fn layout_is_deterministic_and_origin_unshifted() {
        let a = axial_to_pixel(HexCoord::new(3, -2), HEX_GFX);
        let b = axial_to_pixel(HexCoord::new(3, -2), HEX_GFX);
        assert_eq!(a, b);
        assert_eq!(axial_to_pixel(HexCoord::ORIGIN, HEX_GFX), pos2(0.0, 0.0));
    }

    #[test]
    fn odd_columns_drop_half_a_sprite() {
        assert_eq!(axial_to_pixel(HexCoord::new(1, 0), HEX_GFX), pos2(112.5, 80.0));
        assert_eq!(axial_to_pixel(HexCoord::new(2, 1), HEX_GFX), pos2(225.0, 160.0));
        assert_eq!(axial_to_pixel(HexCoord::new(-1, 0), HEX_GFX), pos2(-112.5, 80.0));
    }

    #[test]
    fn zoom_scales_uniformly() {
        let half = sprite_size(0.5);
        assert_eq!(half, vec2(75.0, 80.0));
        assert_eq!(axial_to_pixel(HexCoord::new(1, 1), half), pos2(56.25, 120.0));
    }

    #[test]
    fn origin_is_centered_in_container() {
        assert_eq!(map_origin(vec2(800.0, 600.0), HEX_GFX), vec2(325.0, 220.0));
    }

    #[test]
    fn pointer_resolves_to_tagged_cell() {
        let mut hits = HexHitMap::default();
        for coord in [HexCoord::ORIGIN, HexCoord::new(1, 0)] {
            hits.tag(coord, hexagon(axial_to_pixel(coord, HEX_GFX), HEX_GFX));
        }

        assert_eq!(hits.resolve(pos2(75.0, 80.0)), Some(HexCoord::ORIGIN));
        assert_eq!(hits.resolve(pos2(187.5, 160.0)), Some(HexCoord::new(1, 0)));
        // sprite corner outside the hexagon
        assert_eq!(hits.resolve(pos2(2.0, 2.0)), None);
        assert!(hits.is_tagged(HexCoord::new(1, 0)));
        assert!(!hits.is_tagged(HexCoord::new(0, 1)));
    }

    #[test]
    fn later_cells_win_overlaps() {
        let mut hits = HexHitMap::default();
        let outline = hexagon(pos2(0.0, 0.0), HEX_GFX);
        hits.tag(HexCoord::new(5, 5), outline);
        hits.tag(HexCoord::new(6, 6), outline);

        assert_eq!(hits.resolve(pos2(75.0, 80.0)), Some(HexCoord::new(6, 6)));
        hits.clear();
        assert!(hits.is_empty());
    }
}
