use crate::commands::shared;
use crate::io::report::{ReportWriter, CHECK_HEADER};
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

pub fn run(
    config: PathBuf,
    observations: PathBuf,
    delimiter: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let (detector, batches) = shared::load_inputs(&config, &observations, delimiter.as_deref())?;

    let mut report = ReportWriter::new(shared::open_output(output)?, &CHECK_HEADER)?;
    let mut invalid = 0usize;
    for batch in &batches {
        let valid = detector.is_valid_observations(&batch.labels)?;
        if !valid {
            invalid += 1;
        }
        let unseen = detector.unseen_labels(&batch.labels);
        report.write_check(&batch.id, batch.labels.len(), valid, &unseen)?;
    }

    info!(batches = batches.len(), invalid, "check complete");
    report.finish()?.flush()?;
    Ok(())
}
