use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::ModelRole;

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "dicenovelty",
    version,
    about = "Bayesian fair-vs-cheat novelty detection for die rolls"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score observation batches against the configured detector.
    Score {
        /// Detector configuration (TOML) with categories and priors.
        #[arg(long, value_name = "TOML")]
        config: PathBuf,

        /// Table with a `label` column and an optional `batch` column.
        #[arg(long, value_name = "FILE")]
        observations: PathBuf,

        /// Field delimiter of the observation table. Detected when omitted.
        #[arg(long)]
        delimiter: Option<String>,

        /// Novelty threshold: a Bayes factor with two models, a raw likelihood with one.
        #[arg(long)]
        threshold: Option<f64>,

        /// Model whose MAP estimate is reported.
        #[arg(long = "map-model", value_enum, default_value_t = MapModel::Fair)]
        map_model: MapModel,

        /// Grow the category set when a batch contains unseen labels.
        #[arg(long)]
        extend: bool,

        /// Write the report here instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Report which batches contain labels outside the category set.
    Check {
        /// Detector configuration (TOML) with categories and priors.
        #[arg(long, value_name = "TOML")]
        config: PathBuf,

        /// Table with a `label` column and an optional `batch` column.
        #[arg(long, value_name = "FILE")]
        observations: PathBuf,

        /// Field delimiter of the observation table. Detected when omitted.
        #[arg(long)]
        delimiter: Option<String>,

        /// Write the report here instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MapModel {
    Fair,
    Cheat,
}

impl From<MapModel> for ModelRole {
    fn from(value: MapModel) -> Self {
        match value {
            MapModel::Fair => ModelRole::Fair,
            MapModel::Cheat => ModelRole::Cheat,
        }
    }
}
