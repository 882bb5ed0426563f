pub mod database;
pub mod drive;
pub mod logging;
pub mod telegram;
