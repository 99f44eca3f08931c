pub mod app;
#[cfg(feature = "ssr")]
pub mod cli;

pub use app::terminal::{CommandRes, Terminal, TerminalConfig};
