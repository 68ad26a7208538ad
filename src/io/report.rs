use crate::model::{Assessment, Label};
use anyhow::Result;
use csv::{Writer, WriterBuilder};
use std::io::Write;

const NA: &str = "NA";

pub const SCORE_HEADER: [&str; 9] = [
    "batch",
    "n",
    "log_marginal_fair",
    "log_marginal_cheat",
    "log_bayes_factor",
    "likelihood",
    "novel",
    "map",
    "status",
];

pub const CHECK_HEADER: [&str; 4] = ["batch", "n", "valid", "unseen"];

/// Tab-separated report of scored batches.
pub struct ReportWriter<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W, header: &[&str]) -> Result<Self> {
        let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(inner);
        writer.write_record(header)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_assessment<T: Label>(
        &mut self,
        batch: &str,
        assessment: &Assessment<T>,
        status: &str,
    ) -> Result<()> {
        let map = assessment
            .map
            .iter()
            .map(|(label, p)| format!("{label}={p:.4}"))
            .collect::<Vec<_>>()
            .join(";");
        self.writer.write_record([
            batch.to_string(),
            assessment.n().to_string(),
            format!("{:.6}", assessment.log_marginal_fair),
            fmt_opt(assessment.log_marginal_cheat, |v| format!("{v:.6}")),
            fmt_opt(assessment.log_bayes_factor, |v| format!("{v:.6}")),
            fmt_opt(assessment.likelihood, |v| format!("{v:.6e}")),
            assessment.novel.to_string(),
            map,
            status.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Row for a batch that could not be scored.
    pub fn write_failure(&mut self, batch: &str, n: usize, status: &str) -> Result<()> {
        let n = n.to_string();
        self.writer
            .write_record([batch, n.as_str(), NA, NA, NA, NA, NA, NA, status])?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_check<T: Label>(
        &mut self,
        batch: &str,
        n: usize,
        valid: bool,
        unseen: &[T],
    ) -> Result<()> {
        let unseen = if unseen.is_empty() {
            NA.to_string()
        } else {
            unseen
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        self.writer
            .write_record([batch.to_string(), n.to_string(), valid.to_string(), unseen])?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush report: {}", e.error()))
    }
}

fn fmt_opt(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| NA.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::presets::{d6, die_faces};
    use crate::model::ModelRole;

    #[test]
    fn test_score_rows() {
        let detector = d6().unwrap();
        let assessment = detector
            .assess(&die_faces(6), None, ModelRole::Fair)
            .unwrap();
        let mut report = ReportWriter::new(Vec::new(), &SCORE_HEADER).unwrap();
        report.write_assessment("b1", &assessment, "ok").unwrap();
        report.write_failure("b2", 3, "unknown-category").unwrap();
        assert_eq!(report.rows(), 2);
        let text = String::from_utf8(report.finish().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], SCORE_HEADER.join("\t"));
        assert!(lines[1].starts_with("b1\t6\t-10.873689\t"));
        assert!(lines[1].contains("\t-1.841127\tNA\tfalse\t1=0.1667;"));
        assert!(lines[1].ends_with("6=0.1667\tok"));
        assert_eq!(lines[2], "b2\t3\tNA\tNA\tNA\tNA\tNA\tNA\tunknown-category");
    }

    #[test]
    fn test_check_rows() {
        let mut report = ReportWriter::new(Vec::new(), &CHECK_HEADER).unwrap();
        report.write_check::<u32>("b1", 4, true, &[]).unwrap();
        report.write_check("b2", 2, false, &[7u32, 9]).unwrap();
        let text = String::from_utf8(report.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "batch\tn\tvalid\tunseen\nb1\t4\ttrue\tNA\nb2\t2\tfalse\t7,9\n"
        );
    }
}
