pub mod catalog;
pub mod drive;
pub mod executor;
pub mod telegram;
