/// A slash command with its argument text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Upload(Option<String>),
    Delete(Option<String>),
    List(Option<String>),
    Stats,
    Unknown(String),
}

impl Command {
    /// Parses `/name[@bot] [args]`. Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;

        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        // "/upload@my_bot" addresses a specific bot in group chats
        let name = head.split('@').next().unwrap_or(head);
        if name.is_empty() {
            return None;
        }

        let args = (!args.is_empty()).then(|| args.to_string());

        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "upload" => Command::Upload(args),
            "delete" => Command::Delete(args),
            "list" => Command::List(args),
            "stats" => Command::Stats,
            other => Command::Unknown(other.to_string()),
        })
    }
}
