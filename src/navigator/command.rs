use crate::catalog::PathKey;
use crate::jump::JumpTarget;
use std::fmt;

/// A user command for a navigator, as typed into `guide-walk` or wired to a button.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Next,
    Prev,
    /// Zero-based choice index.
    Choose(usize),
    Jump(JumpTarget),
    Reset,
    ToggleShowAll,
    SelectPath(PathKey),
    MainPath,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandParseError {
    pub input: String,
    pub reason: &'static str,
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse command '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for CommandParseError {}

impl Command {
    /// Parse the textual command language.
    ///
    /// Choice numbers are 1-based as displayed (`choose 2` or just `2`).
    pub fn parse(input: &str) -> Result<Self, CommandParseError> {
        let trimmed = input.trim();
        let err = |reason| CommandParseError {
            input: trimmed.to_string(),
            reason,
        };
        let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (trimmed, ""),
        };

        match verb {
            "" => Err(err("empty command")),
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" | "back" | "b" => Ok(Command::Prev),
            "reset" | "restart" => Ok(Command::Reset),
            "all" | "toggle" => Ok(Command::ToggleShowAll),
            "main" => Ok(Command::MainPath),
            "path" => {
                if rest.is_empty() {
                    Err(err("path needs a name"))
                } else {
                    Ok(Command::SelectPath(PathKey(rest.to_string())))
                }
            }
            "jump" | "j" => {
                if rest.is_empty() {
                    Err(err("jump needs a <key>:<index> target"))
                } else {
                    Ok(Command::Jump(JumpTarget::parse(rest)))
                }
            }
            "choose" | "c" => parse_choice(rest).ok_or_else(|| err("choose needs a number from 1")),
            number => parse_choice(number).ok_or_else(|| err("unknown command")),
        }
    }
}

fn parse_choice(raw: &str) -> Option<Command> {
    let number: usize = raw.parse().ok()?;
    number.checked_sub(1).map(Command::Choose)
}
