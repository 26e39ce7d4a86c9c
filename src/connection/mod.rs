pub mod config;
pub use config::*;

pub mod cursor_provider;
pub use cursor_provider::*;

pub mod connection;
pub use connection::*;
