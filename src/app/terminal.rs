mod archive_tools;
mod command;
mod components;
mod cp_mv_tools;
mod fs_tools;
mod session;
mod simple_tools;
mod system_tools;
mod text_tools;
pub mod vfs;

pub use command::{Cmd, CommandRes};

use std::collections::HashMap;

use tracing::debug;

use archive_tools::{UnzipCommand, ZipCommand};
use command::VfsCommand;
use cp_mv_tools::{CpCommand, MvCommand};
use fs_tools::{
    CatCommand, CdCommand, ChmodCommand, ChownCommand, DuCommand, FindCommand, LsCommand,
    MkdirCommand, RenameCommand, RmCommand, RmdirCommand, StatCommand, TouchCommand, TreeCommand,
};
use session::Session;
use simple_tools::{EchoCommand, HelpCommand, HistoryCommand, PwdCommand};
use system_tools::{ExitCommand, UnknownCommand};
use text_tools::{DiffCommand, GrepCommand, HeadCommand, TailCommand, WcCommand};
use vfs::VirtualFilesystem;

const ECHO_PREFIX: &str = "echo ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Name shown in the "command not found" message.
    pub shell_name: String,
    /// Lets `echo text > file` and `echo text >> file` write to the tree.
    pub echo_redirect: bool,
    pub prompt_user: String,
    pub prompt_host: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            shell_name: "zsh".to_string(),
            echo_redirect: false,
            prompt_user: "user".to_string(),
            prompt_host: "terminal".to_string(),
        }
    }
}

/// One tree plus the session positioned in it. Every call to
/// [`Terminal::execute`] runs to completion; callers sharing a terminal must
/// serialize access themselves.
pub struct Terminal {
    config: TerminalConfig,
    vfs: VirtualFilesystem,
    session: Session,
    commands: HashMap<Cmd, Box<dyn VfsCommand>>,
    unknown: UnknownCommand,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new(TerminalConfig::default())
    }
}

impl Terminal {
    pub fn new(config: TerminalConfig) -> Self {
        let vfs = VirtualFilesystem::new();
        let session = Session::new(&vfs);
        let unknown = UnknownCommand::new(config.shell_name.clone());
        let mut terminal = Self {
            config,
            vfs,
            session,
            commands: HashMap::new(),
            unknown,
        };
        terminal.initialize_commands();
        terminal
    }

    fn initialize_commands(&mut self) {
        // Tree commands
        self.commands.insert(Cmd::MkDir, Box::new(MkdirCommand));
        self.commands.insert(Cmd::RmDir, Box::new(RmdirCommand));
        self.commands.insert(Cmd::Tree, Box::new(TreeCommand));
        self.commands.insert(Cmd::Rename, Box::new(RenameCommand));
        self.commands.insert(Cmd::Touch, Box::new(TouchCommand));
        self.commands.insert(Cmd::Cat, Box::new(CatCommand));
        self.commands.insert(Cmd::Rm, Box::new(RmCommand));
        self.commands.insert(Cmd::Cd, Box::new(CdCommand));
        self.commands.insert(Cmd::Ls, Box::new(LsCommand));
        self.commands.insert(Cmd::Find, Box::new(FindCommand));
        self.commands.insert(Cmd::Chmod, Box::new(ChmodCommand));
        self.commands.insert(Cmd::Chown, Box::new(ChownCommand));
        self.commands.insert(Cmd::Stat, Box::new(StatCommand));
        self.commands.insert(Cmd::Du, Box::new(DuCommand));
        self.commands.insert(Cmd::Cp, Box::new(CpCommand));
        self.commands.insert(Cmd::Mv, Box::new(MvCommand));

        // File content commands
        self.commands.insert(Cmd::Head, Box::new(HeadCommand));
        self.commands.insert(Cmd::Tail, Box::new(TailCommand));
        self.commands.insert(Cmd::Wc, Box::new(WcCommand));
        self.commands.insert(Cmd::Grep, Box::new(GrepCommand));
        self.commands.insert(Cmd::Diff, Box::new(DiffCommand));
        self.commands.insert(Cmd::Zip, Box::new(ZipCommand));
        self.commands.insert(Cmd::Unzip, Box::new(UnzipCommand));

        // Session commands
        self.commands.insert(
            Cmd::Echo,
            Box::new(EchoCommand::new(self.config.echo_redirect)),
        );
        self.commands.insert(Cmd::Pwd, Box::new(PwdCommand));
        self.commands.insert(Cmd::History, Box::new(HistoryCommand));
        self.commands.insert(Cmd::Help, Box::new(HelpCommand));
        self.commands.insert(Cmd::Exit, Box::new(ExitCommand));
    }

    /// Runs one raw line and returns its output text, failures included.
    pub fn execute(&mut self, input: &str) -> String {
        self.handle_command(input).into_text()
    }

    pub fn handle_command(&mut self, input: &str) -> CommandRes {
        // recorded before anything can reject it
        self.session.record(input);

        let (cmd, args): (Cmd, Vec<&str>) = match input.strip_prefix(ECHO_PREFIX) {
            Some(rest) => (Cmd::Echo, vec![rest]),
            None => {
                let mut parts = input.split(' ');
                let cmd_text = parts.next().unwrap_or_default();
                (Cmd::from(cmd_text), parts.collect())
            }
        };
        debug!(?cmd, args = args.len(), "dispatching command");

        match self.commands.get(&cmd) {
            Some(command) => command.execute(&mut self.vfs, &mut self.session, &args),
            None => self
                .unknown
                .execute(&mut self.vfs, &mut self.session, &[input]),
        }
    }

    /// The path `pwd` prints, e.g. `~/projeto`.
    pub fn current_path(&self) -> String {
        self.session.current_path(&self.vfs)
    }

    /// Every line received since the last reset, newline separated.
    pub fn history(&self) -> String {
        self.session.history()
    }

    pub fn prompt(&self) -> String {
        format!(
            "{}@{}:{} $",
            self.config.prompt_user,
            self.config.prompt_host,
            self.current_path()
        )
    }
}
