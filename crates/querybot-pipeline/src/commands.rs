//! Slash commands recognized before anything reaches the backend.

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`: greeting plus usage examples.
    Start,
    Help,
    Ping,
    /// `/yes`: bundle and send the pending images.
    Yes,
    /// `/no`: discard the pending images.
    No,
}

impl Command {
    /// Parse the leading token of `text` as a command.
    ///
    /// Matching is case-insensitive and tolerates a `@botname` suffix
    /// (`/yes@querybot`). Trailing arguments are ignored. Returns `None` for
    /// plain text and for unknown commands, which are then treated as queries.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(cmd, _bot)| cmd);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "ping" => Some(Command::Ping),
            "yes" => Some(Command::Yes),
            "no" => Some(Command::No),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Ping => "ping",
            Command::Yes => "yes",
            Command::No => "no",
        }
    }
}
