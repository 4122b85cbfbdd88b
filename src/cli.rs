//! Interactive command parsing for the terminal front end.

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(String),
    Toggle(usize),
    Thumbnail(usize),
    DataUri(usize),
    Show,
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  generate <topic>   generate 5 strategies (a bare line of text does the same)
  toggle <n>         expand or collapse card n
  thumb <n>          generate a thumbnail for card n
  uri <n>            print card n's thumbnail as a data URI
  show               redraw all cards
  help               show this message
  quit               exit";

/// Parse a line of input. Card numbers are 1-based on input and returned
/// 0-based; an invalid card number is reported as an error message.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "generate" | "g" => Ok(Command::Generate(rest.to_string())),
        "toggle" | "t" => parse_card(rest).map(Command::Toggle),
        "thumb" | "thumbnail" => parse_card(rest).map(Command::Thumbnail),
        "uri" => parse_card(rest).map(Command::DataUri),
        "show" | "ls" if rest.is_empty() => Ok(Command::Show),
        "help" | "?" if rest.is_empty() => Ok(Command::Help),
        "quit" | "exit" | "q" if rest.is_empty() => Ok(Command::Quit),
        _ => Ok(Command::Generate(line.to_string())),
    }
}

fn parse_card(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Expected a card number (1, 2, ...), got '{}'", arg)),
    }
}
