use crate::io::{load_batches, load_config, parse_delimiter, ObservationBatch};
use crate::model::NoveltyDetector;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Detector built from the TOML config plus the observation batches to run through it.
pub fn load_inputs(
    config: &Path,
    observations: &Path,
    delimiter: Option<&str>,
) -> Result<(NoveltyDetector<String>, Vec<ObservationBatch>)> {
    let config = load_config(config)
        .with_context(|| format!("failed to load config {}", config.display()))?;
    let detector = config
        .build_detector()
        .context("invalid detector configuration")?;
    info!(
        categories = detector.categories().len(),
        dual = detector.mode().is_dual(),
        threshold = detector.mode().default_threshold(),
        "loaded detector"
    );

    let delimiter = delimiter.map(parse_delimiter).transpose()?;
    let batches = load_batches(observations, delimiter)?;
    info!(
        batches = batches.len(),
        observations = batches.iter().map(|b| b.labels.len()).sum::<usize>(),
        "loaded observations from {}",
        observations.display()
    );
    Ok((detector, batches))
}

pub fn open_output(path: Option<PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("unable to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
