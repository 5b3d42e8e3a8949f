/// Bot commands understood by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Informational greeting, open to everyone.
    Start,
    /// Administrator only: mark the administrator as available.
    Available,
    /// Administrator only: mark the administrator as away.
    Away,
    /// Any other slash command; dropped.
    Unknown(String),
}

impl Command {
    /// Commands registered with the platform, as `(name, description)`.
    pub const MENU: [(&'static str, &'static str); 3] = [
        ("start", "How this bot works"),
        ("available", "Admin only: mark yourself available"),
        ("away", "Admin only: mark yourself away"),
    ];

    /// Parse a leading `/command` (optionally `/command@botname`).
    ///
    /// Returns `None` when `text` is not a command, or when it is addressed to
    /// a different bot than `bot_username`.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let body = text.trim_start().strip_prefix('/')?;
        let word = body.split_whitespace().next().unwrap_or("");
        let (name, target) = match word.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (word, None),
        };
        if let (Some(target), Some(ours)) = (target, bot_username)
            && !target.eq_ignore_ascii_case(ours.trim_start_matches('@'))
        {
            return None;
        }

        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "available" => Self::Available,
            "away" => Self::Away,
            _ => Self::Unknown(name.to_string()),
        })
    }

    /// Whether only the administrator may run this command.
    #[must_use]
    pub fn admin_only(&self) -> bool {
        matches!(self, Self::Available | Self::Away)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("/start", Some(Command::Start))]
    #[case("/available", Some(Command::Available))]
    #[case("/AWAY", Some(Command::Away))]
    #[case("/away now please", Some(Command::Away))]
    #[case("  /start", Some(Command::Start))]
    #[case("/start@courier_bot", Some(Command::Start))]
    #[case("/start@Courier_Bot", Some(Command::Start))]
    #[case("/start@other_bot", None)]
    #[case("/help", Some(Command::Unknown("help".into())))]
    #[case("hello", None)]
    #[case("hello /start", None)]
    fn parse(#[case] text: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::parse(text, Some("courier_bot")), expected);
    }

    #[test]
    fn any_target_accepted_when_username_unknown() {
        assert_eq!(Command::parse("/away@whatever", None), Some(Command::Away));
    }

    #[test]
    fn only_availability_is_admin_only() {
        assert!(!Command::Start.admin_only());
        assert!(Command::Available.admin_only());
        assert!(Command::Away.admin_only());
        assert!(!Command::Unknown("x".into()).admin_only());
    }

    #[test]
    fn menu_matches_parser() {
        for (name, _) in Command::MENU {
            let parsed = Command::parse(&format!("/{name}"), None).unwrap();
            assert!(!matches!(parsed, Command::Unknown(_)));
        }
    }
}
