// Slash commands typed into the chat input

/// A parsed `/command`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Join(String),
    Nick(String),
    Quit,
    Msg { target: String, text: String },
    /// Known command with missing arguments; carries the usage text
    Usage(&'static str),
    Unknown(String),
}

impl SlashCommand {
    /// Parse chat input; `None` when it is plain text
    pub fn parse(input: &str) -> Option<Self> {
        let body = input.trim().strip_prefix('/')?;
        let (name, arg) = match body.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (body, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "join" if arg.is_empty() => Self::Usage("usage: /join #chan"),
            "join" => Self::Join(arg.to_string()),
            "nick" if arg.is_empty() => Self::Usage("usage: /nick newnick"),
            "nick" => Self::Nick(arg.to_string()),
            "quit" => Self::Quit,
            "msg" => match arg.split_once(' ') {
                Some((target, text)) if !text.trim().is_empty() => Self::Msg {
                    target: target.to_string(),
                    text: text.trim().to_string(),
                },
                _ => Self::Usage("usage: /msg target text"),
            },
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}
