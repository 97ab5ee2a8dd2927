pub const DEFAULT_COMMAND_PREFIX: &str = "/ai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enumerates supported `CommandVerb` values.
pub enum CommandVerb {
    Plan,
    Propose,
}

impl CommandVerb {
    /// Case-insensitive verb lookup; `pr` is kept as an alias of `propose`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plan" => Some(Self::Plan),
            "propose" | "pr" => Some(Self::Propose),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Propose => "propose",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A recognized command with a non-empty request.
pub struct BridgeCommand {
    pub verb: CommandVerb,
    pub request_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `ParsedBridgeCommand` values.
pub enum ParsedBridgeCommand {
    Run(BridgeCommand),
    /// Recognized verb without a request payload.
    Usage { verb: CommandVerb },
}

/// Parses `<prefix> <verb> <request...>` from a raw comment body.
///
/// Returns `None` when the body is not addressed to the bridge or names an
/// unknown verb; callers treat that as a silent no-op.
pub fn parse_bridge_command(body: &str, command_prefix: &str) -> Option<ParsedBridgeCommand> {
    let trimmed = body.trim();
    let (prefix, args) = split_first_token(trimmed);
    let command_prefix = command_prefix.trim();
    if prefix.is_empty() || !prefix.eq_ignore_ascii_case(command_prefix) {
        return None;
    }

    let (verb, remainder) = split_first_token(args);
    let verb = CommandVerb::parse(verb)?;
    let request_text = remainder.trim();
    if request_text.is_empty() {
        return Some(ParsedBridgeCommand::Usage { verb });
    }
    Some(ParsedBridgeCommand::Run(BridgeCommand {
        verb,
        request_text: request_text.to_string(),
    }))
}

fn split_first_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], &text[index..]),
        None => (text, ""),
    }
}
