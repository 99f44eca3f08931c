use std::{net::SocketAddr, time::Duration};

use clap::{Parser, ValueEnum};

use crate::app::{api::SessionLimits, terminal::TerminalConfig};

#[derive(Debug, Clone, ValueEnum, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Silent => None,
        }
    }
}

/// Serves in-memory terminals over HTTP, one per `x-session-id`.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "VFS_TERMINAL_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,

    #[arg(long, short, env = "VFS_TERMINAL_LOG", default_value = "info", value_enum)]
    pub log_level: LogLevel,

    /// Name shown in "command not found" messages
    #[arg(long, env = "VFS_TERMINAL_SHELL", default_value = "zsh")]
    pub shell_name: String,

    /// Let `echo text > file` and `echo text >> file` write files
    #[arg(long, env = "VFS_TERMINAL_ECHO_REDIRECT")]
    pub echo_redirect: bool,

    /// Sessions kept before the least recently used one is dropped
    #[arg(long, env = "VFS_TERMINAL_MAX_SESSIONS", default_value_t = 1024)]
    pub max_sessions: usize,

    /// Seconds a session may sit unused before it is dropped
    #[arg(long, env = "VFS_TERMINAL_SESSION_IDLE_SECS", default_value_t = 1800)]
    pub session_idle_secs: u64,
}

impl Cli {
    pub fn terminal_config(&self) -> TerminalConfig {
        TerminalConfig {
            shell_name: self.shell_name.clone(),
            echo_redirect: self.echo_redirect,
            ..TerminalConfig::default()
        }
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions.max(1),
            idle_timeout: Duration::from_secs(self.session_idle_secs),
        }
    }
}
