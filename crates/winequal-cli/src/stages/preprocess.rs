use anyhow::{Context, Result};

use winequal_classifiers::config::PipelineConfig;
use winequal_classifiers::pipeline;

pub fn run_preprocessing(config: &PipelineConfig) -> Result<()> {
    let rows = pipeline::run_preprocess(config).with_context(|| {
        format!(
            "Failed to merge {} and {}",
            config.red_wine_data.display(),
            config.white_wine_data.display()
        )
    })?;
    println!("Wrote {} rows to {}", rows, config.processed_data.display());
    Ok(())
}
