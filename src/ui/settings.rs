use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    /// Multiplier on the 150×160 hex sprite
    pub map_zoom: f32,

    /// How long success and error notices stay up
    pub notice_seconds: f32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            map_zoom: 0.6,
            notice_seconds: 3.5,
        }
    }
}

impl UiSettings {
    /// Pulls hand-edited values back into usable ranges.
    pub fn clamped(mut self) -> Self {
        self.ui_scale = self.ui_scale.clamp(0.75, 2.0);
        self.map_zoom = self.map_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.notice_seconds = self.notice_seconds.clamp(1.0, 30.0);
        self
    }

    pub fn notice_lifetime(&self) -> Duration {
        Duration::from_secs_f32(self.notice_seconds.clamp(1.0, 30.0))
    }
}
