//! CLI module - argument parsing, prompts and subcommand runners

pub mod args;
mod prompts;
mod serve;
mod train;

pub use args::{Cli, Commands, ScoreArgs, ServeArgs, TrainArgs};
pub use prompts::*;
pub use serve::{run_score, run_serve};
pub use train::run_train;
