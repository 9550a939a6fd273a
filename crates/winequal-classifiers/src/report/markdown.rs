use std::fmt::Write;

use crate::report::content::{ReportContent, METRIC_HEADERS};

/// Render the Markdown report. The output depends only on `content`.
pub fn render_markdown(content: &ReportContent) -> String {
    let mut md = String::new();
    // writing into a String cannot fail
    let _ = write_markdown(&mut md, content);
    md
}

fn write_markdown(md: &mut String, content: &ReportContent) -> std::fmt::Result {
    writeln!(md, "# {}", content.title)?;
    writeln!(md)?;

    if content.summary.is_some() {
        writeln!(md, "## Dataset Summary")?;
        for (depth, line) in content.summary_lines() {
            writeln!(md, "{}- {}", "  ".repeat(depth), line)?;
        }
        writeln!(md)?;
    }

    writeln!(md, "## Model Performance")?;
    writeln!(md, "| {} |", METRIC_HEADERS.join(" | "))?;
    let rule: Vec<String> = METRIC_HEADERS.iter().map(|h| "-".repeat(h.len() + 2)).collect();
    writeln!(md, "|{}|", rule.join("|"))?;
    for record in &content.metrics {
        writeln!(md, "| {} |", record.cells().join(" | "))?;
    }

    if !content.figures.is_empty() {
        writeln!(md)?;
        writeln!(md, "## Key Visualizations")?;
        for figure in &content.figures {
            writeln!(md, "![{}]({})", figure.caption(), figure.relative_path)?;
        }
    }
    Ok(())
}
