use std::io::Write;
use std::path::Path;

use anyhow::Context;
use gust_report::{text_summary, TextSummaryOptions};
use gust_summary_model::SummaryData;

use crate::definition::SummaryOutputs;

/// Summary used when a test does not provide its own: the text summary on stdout.
pub fn default_text_summary(data: &SummaryData) -> anyhow::Result<SummaryOutputs> {
    let mut outputs = SummaryOutputs::new();
    outputs.insert(
        "stdout".to_string(),
        text_summary(data, &TextSummaryOptions::default()),
    );
    Ok(outputs)
}

/// Write each artefact produced by a summary hook. `stdout` and `stderr` go to those streams,
/// anything else is written as a file relative to `dir`.
pub fn write_summary_outputs(outputs: &SummaryOutputs, dir: &Path) -> anyhow::Result<()> {
    for (name, content) in outputs {
        match name.as_str() {
            "stdout" => {
                let mut out = std::io::stdout().lock();
                out.write_all(content.as_bytes())?;
                out.flush()?;
            }
            "stderr" => {
                let mut err = std::io::stderr().lock();
                err.write_all(content.as_bytes())?;
                err.flush()?;
            }
            _ => {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create summary directory {}", parent.display())
                    })?;
                }
                std::fs::write(&path, content)
                    .with_context(|| format!("Failed to write summary to {}", path.display()))?;
                log::info!("Wrote summary to {}", path.display());
            }
        }
    }

    Ok(())
}
