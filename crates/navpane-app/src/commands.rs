//! Prompt commands for the terminal navigator.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Follow numbered link `n`.
    Follow(usize),
    /// Submit numbered form `n` with urlencoded data.
    Submit(usize, String),
    /// Navigate to a link resolved against the current document.
    Go(String),
    History,
    Help,
    Quit,
}

pub const HELP: &str = "\
  <n>            follow link [n]
  f <n> <data>   submit form {n}, e.g. f 1 name=Ada
  g <link>       go to a link
  h              show history
  ?              this help
  q              quit";

/// Parse one prompt line. `None` for blank input, `Err` with a message for
/// anything unrecognized.
pub fn parse(line: &str) -> Option<Result<Command, String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let cmd = match head {
        "q" | "quit" => Ok(Command::Quit),
        "h" | "history" => Ok(Command::History),
        "?" | "help" => Ok(Command::Help),
        "g" | "go" if !rest.is_empty() => Ok(Command::Go(rest.to_string())),
        "g" | "go" => Err("usage: g <link>".to_string()),
        "f" | "form" => {
            let (n, data) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            match n.parse() {
                Ok(n) => Ok(Command::Submit(n, data.trim().to_string())),
                Err(_) => Err("usage: f <n> <data>".to_string()),
            }
        },
        n => match n.parse() {
            Ok(n) if rest.is_empty() => Ok(Command::Follow(n)),
            _ => Err(format!("unknown command: {line}")),
        },
    };
    Some(cmd)
}
