//! Report assembly: one `ReportContent` rendered to Markdown and PDF.
//!
//! Rendering and writing are best-effort. Failures are logged and collected
//! in the returned status; they never abort the caller.
pub mod content;
pub mod markdown;
pub mod pdf;

use std::path::{Path, PathBuf};

pub use content::{FigureRef, MetricRecord, ReportContent};

use crate::config::ReportConfig;
use crate::error::{PipelineError, ReportSink, Result};

/// Output of `render`.
#[derive(Debug)]
pub struct RenderedReport {
    pub markup: String,
    /// `None` if the PDF could not be produced; the cause is in `errors`.
    pub document: Option<Vec<u8>>,
    pub errors: Vec<PipelineError>,
}

/// Render both documents from one content model.
pub fn render(content: &ReportContent, footer: Option<&str>) -> RenderedReport {
    let markup = markdown::render_markdown(content);
    let mut errors = Vec::new();
    let document = match pdf::render_pdf(content, footer) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("{}", e);
            errors.push(e);
            None
        }
    };
    RenderedReport {
        markup,
        document,
        errors,
    }
}

/// Outcome of writing each report sink.
#[derive(Debug)]
pub struct ReportStatus {
    pub markdown: Result<PathBuf>,
    pub pdf: Result<PathBuf>,
}

impl ReportStatus {
    pub fn is_complete(&self) -> bool {
        self.markdown.is_ok() && self.pdf.is_ok()
    }

    pub fn errors(&self) -> Vec<&PipelineError> {
        [&self.markdown, &self.pdf]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
            .collect()
    }
}

/// Writes the rendered report into the reports directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    reports_dir: PathBuf,
    config: ReportConfig,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(reports_dir: P, config: ReportConfig) -> Self {
        ReportWriter {
            reports_dir: reports_dir.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn markdown_path(&self) -> PathBuf {
        self.reports_dir.join(&self.config.markdown_file)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.reports_dir.join(&self.config.pdf_file)
    }

    fn write(&self, sink: ReportSink, path: PathBuf, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir)
            .and_then(|_| std::fs::write(&path, bytes))
            .map_err(|e| PipelineError::render(sink, format!("{}: {}", path.display(), e)))?;
        log::info!("Wrote {} report to {}", sink, path.display());
        Ok(path)
    }

    /// Render `content` and write both files. Never fails as a whole; see
    /// the per-sink results in the returned status.
    pub fn publish(&self, content: &ReportContent) -> ReportStatus {
        let footer = format!("Generated {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        let rendered = render(content, Some(&footer));

        let markdown = self.write(ReportSink::Markdown, self.markdown_path(), rendered.markup.as_bytes());
        let pdf = match rendered.document {
            Some(bytes) => self.write(ReportSink::Pdf, self.pdf_path(), &bytes),
            None => Err(rendered
                .errors
                .into_iter()
                .next()
                .unwrap_or_else(|| PipelineError::render(ReportSink::Pdf, "no document produced"))),
        };

        let status = ReportStatus { markdown, pdf };
        for e in status.errors() {
            log::error!("Report output failed: {}", e);
        }
        status
    }
}

/// Load externally produced metric rows from a JSON array.
pub fn load_metric_records<P: AsRef<Path>>(path: P) -> Result<Vec<MetricRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::data_load(path, e))?;
    let records: Vec<MetricRecord> =
        serde_json::from_str(&text).map_err(|e| PipelineError::data_load(path, e))?;
    log::info!("Loaded {} metric record(s) from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_writes_both_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let config = ReportConfig::default();
        let content = ReportContent::build(&config, &reports.join("figures"), None, vec![]);

        let status = ReportWriter::new(&reports, config).publish(&content);
        assert!(status.is_complete());
        assert!(reports.join("final_report.md").is_file());
        assert!(reports.join("final_report.pdf").is_file());
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // a file where the reports directory should be
        let blocker = dir.path().join("reports");
        std::fs::write(&blocker, b"").unwrap();
        let config = ReportConfig::default();
        let content = ReportContent::build(&config, &blocker.join("figures"), None, vec![]);

        let status = ReportWriter::new(&blocker, config).publish(&content);
        assert!(!status.is_complete());
        assert_eq!(status.errors().len(), 2);
        assert!(matches!(
            status.markdown,
            Err(PipelineError::Render { sink: ReportSink::Markdown, .. })
        ));
    }

    #[test]
    fn metric_records_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        std::fs::write(
            &path,
            r#"[{"model_name":"DNN","accuracy":0.82,"f1_score":0.8},{"model_name":"SVM","accuracy":0.78,"f1_score":0.75}]"#,
        )
        .unwrap();
        let records = load_metric_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].model_name, "SVM");
        assert!(load_metric_records(dir.path().join("absent.json")).is_err());
    }
}
