//! Parses the line-based commands typed into the client

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `<lake>/<player>=<text>`: a keystroke-equivalent edit of one cell
    Edit {
        lake: String,
        player: String,
        text: String,
    },
    /// `show`: redraw the table
    Show,
    /// `send`: submit immediately instead of waiting for the debounce
    Send,
    /// `quit`
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("expected <lake>/<player>=<score>, got '{0}'")]
    BadEdit(String),
}

/// Parses one input line.
///
/// Lake and player names may contain spaces; the text after `=` is kept
/// verbatim, so invalid scores reach the sheet and are caught at submission.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    match line {
        "" => return Err(CommandError::Empty),
        "show" => return Ok(Command::Show),
        "send" => return Ok(Command::Send),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let bad_edit = || CommandError::BadEdit(line.to_string());

    let (cell, text) = line.split_once('=').ok_or_else(bad_edit)?;
    let (lake, player) = cell.split_once('/').ok_or_else(bad_edit)?;
    let (lake, player) = (lake.trim(), player.trim());
    if lake.is_empty() || player.is_empty() {
        return Err(bad_edit());
    }

    Ok(Command::Edit {
        lake: lake.to_string(),
        player: player.to_string(),
        text: text.trim().to_string(),
    })
}
