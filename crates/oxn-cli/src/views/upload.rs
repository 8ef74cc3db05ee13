use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use oxn_core::{OutputFormat, RunOptions, SelectedFile, UploadPipeline, UploadState};

use super::{spinner, ViewContext};

#[derive(Debug, Clone)]
pub struct UploadArgs {
    pub file: PathBuf,
    pub name: String,
    pub start: bool,
    pub runs: u32,
    pub output_format: OutputFormat,
    /// Parse and preview only.
    pub dry_run: bool,
}

/// Walk one configuration file through the upload pipeline.
///
/// Returns the state the pipeline ended in.
pub async fn upload(
    ctx: &ViewContext,
    out: &mut dyn Write,
    args: &UploadArgs,
) -> Result<UploadState> {
    let mut pipeline = UploadPipeline::new(ctx.config().accepted_extensions.clone());

    pipeline.select_file(SelectedFile::from_path(&args.file))?;
    pipeline.parse()?;
    writeln!(out, "Parsed {}", pipeline.file_name().unwrap_or_default())?;
    if let Some(preview) = pipeline.preview() {
        writeln!(out, "{}", preview)?;
    }

    if args.dry_run {
        writeln!(out, "Dry run. Nothing was sent to the backend.")?;
        return Ok(pipeline.state());
    }

    let api = ctx.api()?;
    let pb = spinner("Saving experiment...");
    let saved = pipeline.save(&api, &args.name).await.map(str::to_string);
    pb.finish_and_clear();
    let id = saved.context("Error happened while saving experiment")?;
    writeln!(out, "✓ Saved experiment '{}' as {}", args.name.trim(), id)?;

    if !args.start {
        writeln!(out, "Not started. Pass --start to save and start in one go.")?;
        return Ok(pipeline.state());
    }

    let options = RunOptions {
        runs: args.runs,
        output_format: args.output_format,
    };
    let pb = spinner("Starting experiment...");
    let started = pipeline
        .start(&api, options)
        .await
        .map(|ack| ack.message.clone());
    pb.finish_and_clear();
    let message = started.context("Error happened while starting experiment")?;

    writeln!(out, "✓ Experiment is starting...")?;
    if let Some(message) = message {
        writeln!(out, "  {}", message)?;
    }
    Ok(pipeline.state())
}
