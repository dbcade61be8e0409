pub mod app;
pub mod center_panel;
pub mod hex_geometry;
pub mod landing;
pub mod left_panel;
pub mod right_panel;
pub mod settings;
pub mod settings_io;
pub mod theme;
pub mod top_bar;
pub mod view;
