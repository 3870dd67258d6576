//! Line commands for the interactive form shell.

use form_controller::DraftField;

pub const HELP: &str = "\
commands:
  show                  print the form
  url <store-url>       set the store URL
  token [value]         set the access token (blank keeps the stored one)
  version <api-version> set the API version
  save                  save the configuration
  test                  test the connection
  disconnect            remove the integration (asks for confirmation)
  cancel | quit         leave without further changes
  help                  show this help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Show,
    Edit { field: DraftField, value: String },
    Save,
    Test,
    Disconnect,
    Cancel,
    Help,
    Empty,
}

pub fn parse_line(line: &str) -> Result<ShellInput, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let edit = |field| ShellInput::Edit {
        field,
        value: rest.to_string(),
    };
    match word.to_ascii_lowercase().as_str() {
        "" => Ok(ShellInput::Empty),
        "show" => Ok(ShellInput::Show),
        "url" => Ok(edit(DraftField::StoreUrl)),
        "token" => Ok(edit(DraftField::AccessToken)),
        "version" => Ok(edit(DraftField::ApiVersion)),
        "save" => Ok(ShellInput::Save),
        "test" => Ok(ShellInput::Test),
        "disconnect" | "delete" => Ok(ShellInput::Disconnect),
        "cancel" | "quit" | "exit" => Ok(ShellInput::Cancel),
        "help" | "?" => Ok(ShellInput::Help),
        other => Err(format!("unknown command '{other}'; type 'help'")),
    }
}

/// Accepts `y`/`yes` in any case; everything else declines.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
