/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Topic,
    Menu,
    Channels,
    Subscribe(String),
    Unsubscribe(String),
    Switch(String),
    /// Text to publish on the current channel.
    Say(String),
    /// The command was recognised but its argument was missing or invalid.
    Usage(&'static str),
    Empty,
}

pub const MENU: &[&str] = &[
    "/subscribe [topic]",
    "/unsubscribe [topic]",
    "/switch [topic]",
    "/channels",
    "/topic",
    "/exit",
];

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Say(line.to_string());
        }

        let (name, arg) = match line.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        match name {
            "/exit" | "/quit" => Command::Exit,
            "/topic" => Command::Topic,
            "/menu" | "/help" => Command::Menu,
            "/channels" => Command::Channels,
            "/subscribe" => with_topic(arg, Command::Subscribe, "/subscribe [topic]"),
            "/unsubscribe" => with_topic(arg, Command::Unsubscribe, "/unsubscribe [topic]"),
            "/switch" => with_topic(arg, Command::Switch, "/switch [topic]"),
            _ => Command::Usage("unknown command, try /menu"),
        }
    }
}

fn with_topic(arg: &str, make: fn(String) -> Command, usage: &'static str) -> Command {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        Command::Usage(usage)
    } else {
        make(arg.to_string())
    }
}
