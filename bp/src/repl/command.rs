//! Slash command parsing

use std::path::PathBuf;

/// Edit applied to a numbered plan list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEdit {
    Add(String),
    /// 1-based index
    Set(usize, String),
    /// 1-based index
    Remove(usize),
}

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Free text: a new idea
    Idea(String),
    Help,
    Quit,
    Status,
    History,
    Save(Option<PathBuf>),
    Export(PathBuf),
    Plan,
    Query(ListEdit),
    Focus(ListEdit),
    /// Comma separated output filenames
    Files(String),
    Confirm,
    Cancel,
    /// Recognized command with bad arguments
    Usage(&'static str),
    Unknown(String),
}

const QUERY_USAGE: &str = "/query add TEXT | /query set N TEXT | /query rm N";
const FOCUS_USAGE: &str = "/focus add TEXT | /focus set N TEXT | /focus rm N";
const FILES_USAGE: &str = "/files a.md, b.md, c.md";
const EXPORT_USAGE: &str = "/export PATH";

impl ReplCommand {
    /// Parse a trimmed, non-empty input line
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if !input.starts_with('/') {
            return Self::Idea(input.to_string());
        }

        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match cmd {
            "/help" | "/h" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            "/status" => Self::Status,
            "/history" => Self::History,
            "/save" => Self::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "/export" if rest.is_empty() => Self::Usage(EXPORT_USAGE),
            "/export" => Self::Export(PathBuf::from(rest)),
            "/plan" | "/p" => Self::Plan,
            "/query" => parse_list_edit(rest).map_or(Self::Usage(QUERY_USAGE), Self::Query),
            "/focus" => parse_list_edit(rest).map_or(Self::Usage(FOCUS_USAGE), Self::Focus),
            "/files" if rest.is_empty() => Self::Usage(FILES_USAGE),
            "/files" => Self::Files(rest.to_string()),
            "/confirm" | "/ok" => Self::Confirm,
            "/cancel" => Self::Cancel,
            other => Self::Unknown(other.to_string()),
        }
    }
}

fn parse_list_edit(args: &str) -> Option<ListEdit> {
    let (verb, rest) = match args.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (args, ""),
    };

    match verb {
        "add" if !rest.is_empty() => Some(ListEdit::Add(rest.to_string())),
        "set" => {
            let (index, text) = rest.split_once(char::is_whitespace)?;
            let index = index.parse().ok()?;
            let text = text.trim();
            (!text.is_empty()).then(|| ListEdit::Set(index, text.to_string()))
        }
        "rm" | "remove" => rest.parse().ok().map(ListEdit::Remove),
        _ => None,
    }
}
