use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::{fs, path::Path};

/// Batch id used when the table has no `batch` column.
pub const DEFAULT_BATCH: &str = "all";

/// Ordered labels that are scored together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationBatch {
    pub id: String,
    pub labels: Vec<String>,
}

/// Load observation batches from a delimited table with a `label` column and
/// an optional `batch` column.
///
/// Batches come back in order of first appearance; labels keep row order.
/// The delimiter is taken from the first line (tab, else comma) when `None`.
pub fn load_batches(path: &Path, delimiter: Option<u8>) -> Result<Vec<ObservationBatch>> {
    let data = fs::read(path)
        .with_context(|| format!("failed to read observations {}", path.display()))?;
    if data.is_empty() {
        bail!("observation file {} is empty", path.display());
    }

    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&data));
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(&data[..]);

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from {}", path.display()))?
        .clone();
    let label_idx = find_column(&headers, "label")
        .ok_or_else(|| anyhow::anyhow!("label column missing in {}", path.display()))?;
    let batch_idx = find_column(&headers, "batch");

    let mut batches: Vec<ObservationBatch> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (row, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to read observation record in {}", path.display()))?;
        let label = record
            .get(label_idx)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("row {} missing label value", row + 1))?;
        let batch_id = match batch_idx {
            Some(idx) => record
                .get(idx)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("row {} missing batch value", row + 1))?,
            None => DEFAULT_BATCH,
        };

        let pos = *positions.entry(batch_id.to_string()).or_insert_with(|| {
            batches.push(ObservationBatch {
                id: batch_id.to_string(),
                labels: Vec::new(),
            });
            batches.len() - 1
        });
        batches[pos].labels.push(label.to_string());
    }

    if batches.is_empty() {
        bail!("observation file {} produced no rows", path.display());
    }
    Ok(batches)
}

/// Parse a delimiter given on the command line (`\t` and `tab` mean tab).
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        s if s.len() == 1 => Ok(s.as_bytes()[0]),
        other => bail!("delimiter must be a single byte, got `{other}`"),
    }
}

fn detect_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or(data);
    if first_line.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_batches_grouped_in_first_seen_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch\tlabel\nb2\t6\nb1\t1\nb2\t6\nb1\t3").unwrap();
        let batches = load_batches(file.path(), None).unwrap();
        assert_eq!(
            batches,
            vec![
                ObservationBatch {
                    id: "b2".into(),
                    labels: vec!["6".into(), "6".into()],
                },
                ObservationBatch {
                    id: "b1".into(),
                    labels: vec!["1".into(), "3".into()],
                },
            ]
        );
    }

    #[test]
    fn test_label_only_table_is_one_batch() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Label\n4\n5\n4").unwrap();
        let batches = load_batches(file.path(), Some(b',')).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].id, DEFAULT_BATCH);
        assert_eq!(batches[0].labels, vec!["4", "5", "4"]);
    }

    #[test]
    fn test_missing_label_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch,value\na,1").unwrap();
        let err = load_batches(file.path(), None).unwrap_err();
        assert!(err.to_string().contains("label column missing"));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert!(parse_delimiter(";;").is_err());
    }
}
