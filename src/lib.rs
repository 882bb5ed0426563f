pub mod bot;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

pub use bot::webhook::{AppState, create_app};
pub use bot::{Bot, BotSettings};
