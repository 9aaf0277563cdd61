//! One-shot build (without `--dev`).

use anyhow::{Context, Result};

use crate::log;
use crate::logger::Logger;
use crate::pipeline::{BuildReport, Rebuild};

/// Run the pipeline once and report the result.
pub fn build_site(pipeline: &dyn Rebuild, logger: &Logger) -> Result<BuildReport> {
    let report = pipeline.rebuild().context("build failed")?;
    log!(logger; "build"; "done: {}", report.summary());
    Ok(report)
}
