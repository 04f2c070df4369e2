use api_structs::ErrorGroupId;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "commands: toggle <id> | view <id> <overview|traces|spans|logs|correlation|rca> | refresh | share <id> | export <id> | quit";

/// A line typed into the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Toggle(ErrorGroupId),
    /// The tag is validated by the console, not here.
    View { id: ErrorGroupId, sub_view: String },
    Refresh,
    Share(ErrorGroupId),
    Export(ErrorGroupId),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for ConsoleCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Err(ParseCommandError::Empty);
        };
        let args: Vec<&str> = words.collect();
        let single_id = |usage: &'static str| match args.as_slice() {
            [id] => Ok(id.to_string()),
            _ => Err(ParseCommandError::Usage(usage)),
        };
        let parsed = match command {
            "toggle" | "t" => ConsoleCommand::Toggle(single_id("toggle <id>")?),
            "view" | "v" => match args.as_slice() {
                [id, sub_view] => ConsoleCommand::View {
                    id: id.to_string(),
                    sub_view: sub_view.to_string(),
                },
                _ => return Err(ParseCommandError::Usage("view <id> <sub-view>")),
            },
            "refresh" | "r" => ConsoleCommand::Refresh,
            "share" => ConsoleCommand::Share(single_id("share <id>")?),
            "export" => ConsoleCommand::Export(single_id("export <id>")?),
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "q" | "exit" => ConsoleCommand::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(parsed)
    }
}
