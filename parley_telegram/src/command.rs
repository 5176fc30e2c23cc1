use parley_core::UserId;
use teloxide::types::BotCommand;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/c <text>`, a conversation turn.
    Chat(String),
    Clear,
    Start,
    Help,
    List,
    Search(Option<UserId>),
    Delete(Option<UserId>),
    Add(Option<UserId>),
    Log,
}

impl Command {
    fn all() -> Vec<BotCommand> {
        [
            ("c", "Talk to the assistant"),
            ("clear", "Clear conversation context"),
            ("start", "Show the banner"),
            ("help", "Show this help"),
        ]
        .into_iter()
        .map(|(command, description)| BotCommand::new(command, description))
        .collect()
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    /// Parses a leading `/command`, dropping any `@bot_name` suffix.
    /// Text that is not one of the known commands yields `None`.
    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim_start();
        if !text.starts_with('/') {
            return None;
        }

        let (head, rest) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let user_id = || rest.split_whitespace().next()?.parse::<UserId>().ok();

        match name.as_str() {
            "/c" => Some(Self::Chat(rest.trim().to_string())),
            "/clear" => Some(Self::Clear),
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/list" => Some(Self::List),
            "/search" => Some(Self::Search(user_id())),
            "/delete" => Some(Self::Delete(user_id())),
            "/add" => Some(Self::Add(user_id())),
            "/log" => Some(Self::Log),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::List | Self::Search(_) | Self::Delete(_) | Self::Add(_) | Self::Log
        )
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"
Commands:
/c <text> - talk to the assistant (required in groups)
/clear    - clear conversation context
/start    - show the banner
/help     - show this help

In a private chat, plain messages and .txt/.md files work too.
"
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        r"
︻╦╤─

︻デ═一

╦̵̵̿╤─ ҉ ~ •
"
    }
}
