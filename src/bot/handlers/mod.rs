use crate::services::telegram::{InlineKeyboardButton, MAX_CALLBACK_DATA_LEN};

pub mod callback;
pub mod delete;
pub mod inline;
pub mod list;
pub mod lookup;
pub mod start;
pub mod stats;
pub mod upload;

/// Prefix of the callback payload that asks for an image's share link.
pub const LINK_CALLBACK_PREFIX: &str = "link_";

pub fn caption_for(title: &str) -> String {
    format!("📌 {}", title)
}

/// `link_<title>` button, or `None` when the payload would not fit in a callback.
pub fn link_button(label: &str, title: &str) -> Option<InlineKeyboardButton> {
    let data = format!("{}{}", LINK_CALLBACK_PREFIX, title);
    if data.len() > MAX_CALLBACK_DATA_LEN {
        return None;
    }
    Some(InlineKeyboardButton::callback(label, data))
}
