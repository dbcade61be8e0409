pub mod catalog;
pub mod game_save;
pub mod game_state;
pub mod message;
pub mod selection;
pub mod visuals;
