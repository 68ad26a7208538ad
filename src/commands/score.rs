use crate::cli::MapModel;
use crate::commands::shared;
use crate::io::report::{ReportWriter, SCORE_HEADER};
use crate::model::{DiceError, ModelRole};
use anyhow::{bail, Result};
use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: PathBuf,
    observations: PathBuf,
    delimiter: Option<String>,
    threshold: Option<f64>,
    map_model: MapModel,
    extend: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let (mut detector, batches) =
        shared::load_inputs(&config, &observations, delimiter.as_deref())?;
    let role = ModelRole::from(map_model);
    if role == ModelRole::Cheat && !detector.mode().is_dual() {
        bail!("--map-model cheat needs a [cheat] prior in {}", config.display());
    }

    let mut report = ReportWriter::new(shared::open_output(output)?, &SCORE_HEADER)?;
    let mut novel = 0usize;
    for batch in &batches {
        let mut status = "ok";
        if extend {
            let grown = match detector.extend_for(&batch.labels) {
                Cow::Owned(grown) => Some(grown),
                Cow::Borrowed(_) => None,
            };
            if let Some(grown) = grown {
                info!(
                    batch = %batch.id,
                    categories = grown.categories().len(),
                    "extended category set"
                );
                detector = grown;
                status = "extended";
            }
        }

        match detector.assess(&batch.labels, threshold, role) {
            Ok(assessment) => {
                if assessment.novel {
                    novel += 1;
                }
                report.write_assessment(&batch.id, &assessment, status)?;
            }
            Err(DiceError::UnknownCategory { label, .. }) => {
                warn!(batch = %batch.id, %label, "batch has unknown category; skipping");
                report.write_failure(&batch.id, batch.labels.len(), "unknown-category")?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(batches = report.rows(), novel, "scoring complete");
    report.finish()?.flush()?;
    Ok(())
}
