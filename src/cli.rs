//! CLI layer: clap definitions in `parse`, dispatch in `route`.

pub mod parse;
pub mod route;

pub use parse::{Cli, Commands, StashCommands};
pub use route::RunContext;
