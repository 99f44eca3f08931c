use super::command::{CommandRes, VfsCommand};
use super::session::Session;
use super::vfs::VirtualFilesystem;

/// Wipes the whole tree and the history; the terminal stays usable.
pub struct ExitCommand;

impl VfsCommand for ExitCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, _args: &[&str]) -> CommandRes {
        session.reset(vfs);
        CommandRes::new().with_stdout_text("exit: Terminal encerrado. Inicie uma nova sessão.")
    }
}

/// Fallback for unrecognised keywords. Receives the raw line as its only
/// argument so the message can echo it in full.
pub struct UnknownCommand {
    shell_name: String,
}

impl UnknownCommand {
    pub fn new(shell_name: impl Into<String>) -> Self {
        Self {
            shell_name: shell_name.into(),
        }
    }
}

impl VfsCommand for UnknownCommand {
    fn execute(&self, _vfs: &mut VirtualFilesystem, _session: &mut Session, args: &[&str]) -> CommandRes {
        let line = args.first().copied().unwrap_or_default();
        CommandRes::new().with_stderr(format!("{}: command not found: {line}", self.shell_name))
    }
}
