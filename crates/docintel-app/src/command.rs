//! Parsing of interactive input lines.

use std::path::PathBuf;

use docintel_core::types::ActiveView;

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text: ask it about the active document.
    Ask(String),
    Upload(PathBuf),
    Extract,
    /// Ask a suggested question by its 1-based position.
    Suggest(usize),
    Suggestions,
    /// Switch view, or show the current one when `None`.
    View(Option<ActiveView>),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "upload" if !arg.is_empty() => Command::Upload(PathBuf::from(arg)),
            "extract" => Command::Extract,
            "suggest" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Command::Suggest(n),
                _ => Command::Unknown(line.to_string()),
            },
            "suggestions" => Command::Suggestions,
            "view" => match arg {
                "" => Command::View(None),
                "chat" | "conversation" => Command::View(Some(ActiveView::Conversation)),
                "extract" | "extraction" => Command::View(Some(ActiveView::Extraction)),
                _ => Command::Unknown(line.to_string()),
            },
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a question to ask it about the loaded document.
  /upload <path>      load a PDF, DOCX or TXT document
  /suggestions        list suggested questions
  /suggest <n>        ask suggested question n
  /extract            extract shipment fields
  /view [chat|extract] show or switch the active view
  /quit               exit";
