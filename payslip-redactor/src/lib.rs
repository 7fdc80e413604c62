pub mod cli;
pub mod error;
pub mod load_config;
pub mod page;
pub mod server;

pub use cli::{run, Cli, Commands};
