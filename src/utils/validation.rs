/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 100;

/// Punctuation allowed in titles besides letters and digits
const TITLE_SPECIAL_CHARS: &[char] = &[' ', '-', '_', '.', ','];

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Picks the title for an upload: command arguments first, then the photo caption.
/// Both are trimmed; an empty result is a `MISSING_TITLE` error.
pub fn extract_title(args: Option<&str>, caption: Option<&str>) -> Result<String, ValidationError> {
    let title = args
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .or_else(|| caption.map(str::trim).filter(|c| !c.is_empty()));

    match title {
        Some(title) => Ok(title.to_string()),
        None => Err(ValidationError {
            code: "MISSING_TITLE",
            message: "⚠️ Please provide a title either:\n\
                      1. As command argument: /upload <title>\n\
                      2. Or as image caption"
                .to_string(),
        }),
    }
}

/// Validates an image title
///
/// A title is non-empty, at most [`MAX_TITLE_LEN`] characters, and made only of
/// letters, digits, spaces and `- _ . ,`.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.chars().count();
    let charset_ok = title
        .chars()
        .all(|c| c.is_alphanumeric() || TITLE_SPECIAL_CHARS.contains(&c));

    if len == 0 || len > MAX_TITLE_LEN || !charset_ok {
        return Err(ValidationError {
            code: "INVALID_TITLE",
            message: "⚠️ Invalid title format. Please use:\n\
                      - Letters, numbers, spaces\n\
                      - Max 100 characters\n\
                      - Only these special characters: - _ . ,"
                .to_string(),
        });
    }
    Ok(())
}
