//! Merging the raw red and white wine tables into the processed dataset.
//!
//! The raw files are `;` separated with a shared header. The processed
//! table appends a `type` indicator (1 = red, 0 = white) and the
//! `sulfur_ratio` derived column, and is written comma separated.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::{PipelineError, Result};

pub const TYPE_COLUMN: &str = "type";
pub const SULFUR_RATIO_COLUMN: &str = "sulfur_ratio";

/// Column names used to derive `sulfur_ratio`.
#[derive(Debug, Clone)]
pub struct SulfurColumns<'a> {
    pub free: &'a str,
    pub total: &'a str,
}

impl Default for SulfurColumns<'static> {
    fn default() -> Self {
        SulfurColumns {
            free: "free sulfur dioxide",
            total: "total sulfur dioxide",
        }
    }
}

struct RawTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

fn read_raw_table(path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_path(path)
        .map_err(|e| PipelineError::data_load(path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::data_load(path, format!("failed to read header row: {}", e)))?
        .clone();

    let rows = rdr
        .records()
        .enumerate()
        .map(|(i, r)| r.map_err(|e| PipelineError::data_load(path, format!("line {}: {}", i + 2, e))))
        .collect::<Result<Vec<_>>>()?;

    Ok(RawTable { headers, rows })
}

fn column_index(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PipelineError::data_load(path, format!("missing column '{}'", name)))
}

/// Free over total sulfur dioxide. A zero total gives `inf` for a nonzero
/// free value and `NaN` for `0 / 0`.
pub fn sulfur_ratio(free: f64, total: f64) -> f64 {
    free / total
}

fn derived_row(
    record: &StringRecord,
    type_flag: &str,
    free_idx: usize,
    total_idx: usize,
    path: &Path,
    line: usize,
) -> Result<StringRecord> {
    let parse = |idx: usize| -> Result<f64> {
        record
            .get(idx)
            .unwrap_or("")
            .trim()
            .parse::<f64>()
            .map_err(|_| PipelineError::data_load(path, format!("line {}: sulfur dioxide value is not numeric", line)))
    };
    let ratio = sulfur_ratio(parse(free_idx)?, parse(total_idx)?);

    let mut out: StringRecord = record.iter().map(str::trim).collect();
    out.push_field(type_flag);
    out.push_field(&ratio.to_string());
    Ok(out)
}

/// Merge the red and white tables into `output`. Returns the number of data
/// rows written. Red rows come first.
pub fn preprocess(red: &Path, white: &Path, output: &Path, sulfur: &SulfurColumns<'_>) -> Result<usize> {
    let red_table = read_raw_table(red)?;
    let white_table = read_raw_table(white)?;

    let normalize = |h: &StringRecord| h.iter().map(|s| s.trim().to_string()).collect::<Vec<_>>();
    if normalize(&red_table.headers) != normalize(&white_table.headers) {
        return Err(PipelineError::data_load(
            white,
            format!("header does not match {}", red.display()),
        ));
    }

    let free_idx = column_index(&red_table.headers, sulfur.free, red)?;
    let total_idx = column_index(&red_table.headers, sulfur.total, red)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::data_load(output, e))?;
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .from_path(output)
        .map_err(|e| PipelineError::data_load(output, e))?;

    let mut header: StringRecord = red_table.headers.iter().map(str::trim).collect();
    header.push_field(TYPE_COLUMN);
    header.push_field(SULFUR_RATIO_COLUMN);
    writer
        .write_record(&header)
        .map_err(|e| PipelineError::data_load(output, e))?;

    let mut written = 0;
    for (table, flag, path) in [(&red_table, "1", red), (&white_table, "0", white)] {
        for (i, record) in table.rows.iter().enumerate() {
            let row = derived_row(record, flag, free_idx, total_idx, path, i + 2)?;
            writer
                .write_record(&row)
                .map_err(|e| PipelineError::data_load(output, e))?;
            written += 1;
        }
    }
    writer.flush().map_err(|e| PipelineError::data_load(output, e))?;

    log::info!(
        "Wrote {} rows ({} red, {} white) to {}",
        written,
        red_table.rows.len(),
        white_table.rows.len(),
        output.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::FeatureStore;

    const HEADER: &str = "\"fixed acidity\";\"free sulfur dioxide\";\"total sulfur dioxide\";\"quality\"\n";

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("{}{}", HEADER, body)).unwrap();
        path
    }

    #[test]
    fn merges_tables_and_appends_derived_columns() {
        let dir = tempfile::tempdir().unwrap();
        let red = write(dir.path(), "red.csv", "7.4;11;34;5\n7.8;25;50;5\n");
        let white = write(dir.path(), "white.csv", "7.0;45;170;6\n");
        let out = dir.path().join("data").join("processed.csv");

        let n = preprocess(&red, &white, &out, &SulfurColumns::default()).unwrap();
        assert_eq!(n, 3);

        let ds = FeatureStore::new(&out, "quality").load().unwrap();
        assert_eq!(
            ds.columns(),
            &[
                "fixed acidity",
                "free sulfur dioxide",
                "total sulfur dioxide",
                "quality",
                "type",
                "sulfur_ratio"
            ]
            .map(String::from)
        );
        let type_idx = ds.feature_names().iter().position(|c| c == "type").unwrap();
        let ratio_idx = ds.feature_names().iter().position(|c| c == "sulfur_ratio").unwrap();
        let x = ds.features();
        assert_eq!(x[(0, type_idx)], 1.0);
        assert_eq!(x[(2, type_idx)], 0.0);
        assert!((x[(1, ratio_idx)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mismatched_headers_fail() {
        let dir = tempfile::tempdir().unwrap();
        let red = write(dir.path(), "red.csv", "7.4;11;34;5\n");
        let white = dir.path().join("white.csv");
        std::fs::write(&white, "a;b\n1;2\n").unwrap();
        let err = preprocess(&red, &white, &dir.path().join("o.csv"), &SulfurColumns::default()).unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad { .. }));
    }

    #[test]
    fn missing_raw_file_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let red = write(dir.path(), "red.csv", "7.4;11;34;5\n");
        let err = preprocess(
            &red,
            &dir.path().join("absent.csv"),
            &dir.path().join("o.csv"),
            &SulfurColumns::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn zero_total_follows_float_division() {
        assert_eq!(sulfur_ratio(3.0, 0.0), f64::INFINITY);
        assert!(sulfur_ratio(0.0, 0.0).is_nan());
        assert_eq!(sulfur_ratio(3.0, 6.0), 0.5);
        assert_eq!(sulfur_ratio(3.0, 0.0).to_string(), "inf");
    }
}
