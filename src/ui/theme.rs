use egui::Color32;

use crate::model::message::NoticeKind;
use crate::ui::view::{Standing, Trend};

pub const POSITIVE: Color32 = Color32::from_rgb(110, 200, 120);
pub const NEGATIVE: Color32 = Color32::from_rgb(230, 100, 90);
pub const MUTED: Color32 = Color32::from_rgb(160, 160, 160);

pub const HEX_EDGE: Color32 = Color32::from_rgb(40, 25, 20);
pub const HEX_SELECTED: Color32 = Color32::from_rgb(255, 215, 90);
pub const HEX_OWNED: Color32 = Color32::from_rgb(90, 170, 255);
pub const HEX_START: Color32 = Color32::from_rgb(255, 255, 255);

pub fn trend_color(trend: Trend) -> Color32 {
    match trend {
        Trend::Positive => POSITIVE,
        Trend::Negative => NEGATIVE,
        Trend::Flat => MUTED,
    }
}

pub fn notice_fill(kind: NoticeKind) -> Color32 {
    match kind {
        NoticeKind::Progress => Color32::from_rgb(60, 70, 95),
        NoticeKind::Success => Color32::from_rgb(40, 100, 60),
        NoticeKind::Error => Color32::from_rgb(130, 40, 40),
    }
}

pub fn standing_color(standing: Standing) -> Color32 {
    match standing {
        Standing::Allied | Standing::Friendly => POSITIVE,
        Standing::Neutral => MUTED,
        Standing::Hostile => NEGATIVE,
    }
}

/// Fill per terrain; `None` is fog.
pub fn terrain_color(terrain: Option<&str>) -> Color32 {
    match terrain {
        None => Color32::from_rgb(45, 40, 40),
        Some("Plains") => Color32::from_rgb(176, 98, 60),
        Some("Volcanic") => Color32::from_rgb(110, 45, 35),
        Some("Canyon") => Color32::from_rgb(150, 80, 50),
        Some("Icy_Terrain") => Color32::from_rgb(190, 205, 215),
        Some("Cratered_Highlands") => Color32::from_rgb(130, 95, 75),
        Some("Ancient_Riverbed") => Color32::from_rgb(160, 120, 80),
        Some(_) => Color32::from_rgb(120, 90, 80),
    }
}
