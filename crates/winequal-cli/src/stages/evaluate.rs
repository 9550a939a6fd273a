use anyhow::{Context, Result};

use winequal_classifiers::config::PipelineConfig;
use winequal_classifiers::evaluator::EvaluationReport;
use winequal_classifiers::pipeline::{self, EvaluateOptions};

pub fn format_evaluation_report(report: &EvaluationReport) -> String {
    report
        .outcomes
        .iter()
        .map(|(kind, outcome)| match outcome {
            Ok(m) => format!(
                "{} Accuracy: {:.4} (macro F1 {:.4})",
                kind.display_name(),
                m.accuracy,
                m.f1_score
            ),
            Err(e) => format!("{} failed: {}", kind.display_name(), e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_evaluation(config: &PipelineConfig, options: &EvaluateOptions) -> Result<()> {
    let outcome = pipeline::run_evaluate(config, options).context("Evaluation aborted")?;

    if let Some(evaluation) = &outcome.evaluation {
        println!("{}", format_evaluation_report(evaluation));
    }

    // report problems are logged but never change the exit status
    if let Some(status) = &outcome.report {
        match &status.markdown {
            Ok(path) => println!("Report written to {}", path.display()),
            Err(e) => log::warn!("Markdown report not written: {}", e),
        }
        match &status.pdf {
            Ok(path) => println!("PDF report written to {}", path.display()),
            Err(e) => log::warn!("PDF report not written: {}", e),
        }
    }

    if let Some(evaluation) = &outcome.evaluation {
        let failed: Vec<String> = evaluation.failures().map(|(k, _)| k.to_string()).collect();
        if !failed.is_empty() {
            anyhow::bail!("{} backend(s) failed to evaluate: {}", failed.len(), failed.join(", "));
        }
    }
    Ok(())
}
