use serde::Serialize;

use super::session::Session;
use super::vfs::VirtualFilesystem;

/// A command operating on the tree and the session that owns the current
/// directory. `args` are the space separated tokens after the keyword, empty
/// tokens included.
pub trait VfsCommand: Send + Sync {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes;
}

/// Output of one command line. Failures are text too; `is_err` only tells the
/// caller which kind of text it got.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandRes {
    is_err: bool,
    text: String,
}

impl CommandRes {
    /// Create a new empty CommandRes
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark this result as an error
    pub fn with_error(mut self) -> Self {
        self.is_err = true;
        self
    }

    pub fn with_stdout_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Error text; marks the result as an error
    pub fn with_stderr(self, text: impl Into<String>) -> Self {
        self.with_error().with_stdout_text(text)
    }

    pub fn is_error(&self) -> bool {
        self.is_err
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Token at `index`, or `""` when the line was shorter.
pub fn operand<'a>(args: &[&'a str], index: usize) -> &'a str {
    args.get(index).copied().unwrap_or_default()
}

/// Removes one leading and one trailing double quote, if present.
pub fn strip_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmd {
    MkDir,
    RmDir,
    Tree,
    Rename,
    Touch,
    Echo,
    Cat,
    Rm,
    Cd,
    Pwd,
    History,
    Help,
    Exit,
    Ls,
    Head,
    Tail,
    Wc,
    Find,
    Grep,
    Chmod,
    Chown,
    Stat,
    Du,
    Cp,
    Mv,
    Diff,
    Zip,
    Unzip,
    Unknown,
}

impl From<&str> for Cmd {
    fn from(value: &str) -> Self {
        match value {
            "mkdir" => Self::MkDir,
            "rmdir" => Self::RmDir,
            "tree" => Self::Tree,
            "rename" => Self::Rename,
            "touch" => Self::Touch,
            "echo" => Self::Echo,
            "cat" => Self::Cat,
            "rm" => Self::Rm,
            "cd" => Self::Cd,
            "pwd" => Self::Pwd,
            "history" => Self::History,
            "help" => Self::Help,
            "exit" => Self::Exit,
            "ls" => Self::Ls,
            "head" => Self::Head,
            "tail" => Self::Tail,
            "wc" => Self::Wc,
            "find" => Self::Find,
            "grep" => Self::Grep,
            "chmod" => Self::Chmod,
            "chown" => Self::Chown,
            "stat" => Self::Stat,
            "du" => Self::Du,
            "cp" => Self::Cp,
            "mv" => Self::Mv,
            "diff" => Self::Diff,
            "zip" => Self::Zip,
            "unzip" => Self::Unzip,
            _ => Self::Unknown,
        }
    }
}

impl Cmd {
    pub fn all() -> Vec<&'static str> {
        vec![
            "mkdir", "rmdir", "tree", "rename", "touch", "echo", "cat", "rm", "cd", "pwd",
            "history", "help", "exit", "ls", "head", "tail", "wc", "find", "grep", "chmod",
            "chown", "stat", "du", "cp", "mv", "diff", "zip", "unzip",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_command_is_known() {
        for name in Cmd::all() {
            assert_ne!(Cmd::from(name), Cmd::Unknown, "{name} should map to a command");
        }
        assert_eq!(Cmd::from("MKDIR"), Cmd::Unknown);
        assert_eq!(Cmd::from(""), Cmd::Unknown);
    }

    #[test]
    fn test_strip_quotes_removes_one_each_side() {
        assert_eq!(strip_quotes("\"hello\""), "hello");
        assert_eq!(strip_quotes("\"\"twice\"\""), "\"twice\"");
        assert_eq!(strip_quotes("\"open"), "open");
        assert_eq!(strip_quotes("close\""), "close");
        assert_eq!(strip_quotes("\""), "");
        assert_eq!(strip_quotes("plain text"), "plain text");
    }

    #[test]
    fn test_operand_defaults_to_empty() {
        let args = ["a", "", "c"];
        assert_eq!(operand(&args, 0), "a");
        assert_eq!(operand(&args, 1), "");
        assert_eq!(operand(&args, 5), "");
    }

    #[test]
    fn test_command_res_builders() {
        let ok = CommandRes::new().with_stdout_text("fine");
        assert!(!ok.is_error());
        assert_eq!(ok.text(), "fine");

        let err = CommandRes::new().with_stderr("broken");
        assert!(err.is_error());
        assert_eq!(err.into_text(), "broken");
    }
}
