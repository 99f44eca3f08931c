#[cfg(feature = "ssr")]
pub mod api;
pub mod terminal;
