pub mod check;
pub mod score;
pub mod shared;

use crate::cli::{Cli, Command};
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Score {
            config,
            observations,
            delimiter,
            threshold,
            map_model,
            extend,
            output,
        } => score::run(
            config,
            observations,
            delimiter,
            threshold,
            map_model,
            extend,
            output,
        ),
        Command::Check {
            config,
            observations,
            delimiter,
            output,
        } => check::run(config, observations, delimiter, output),
    }
}
