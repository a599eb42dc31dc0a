use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::prelude::{eprintln, println, *};

// Import domain models and pure functions from core
use outline_core::files::{list_pdf_files, output_os_file_name, FilesError};
use outline_core::{extract_outline, ExtractionResult};

/// Outcome of a run over the input directory.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Module entry point
pub fn run(global: crate::Global) -> Result<()> {
    let summary = process_directory(&global)?;

    log::info!(
        "Processed {} file(s): {} written, {} failed",
        summary.total(),
        summary.written.len(),
        summary.failed.len()
    );

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(Error::FilesFailed {
            failed: summary.failed.len(),
            total: summary.total(),
        }
        .into())
    }
}

/// Extract outlines for every PDF in the input directory.
///
/// Per-file failures are logged and collected unless `fail_fast` is set, in
/// which case the first one is returned as the error.
pub fn process_directory(global: &crate::Global) -> Result<RunSummary> {
    let files = list_pdf_files(&global.input_dir).map_err(|e| match e {
        FilesError::NotADirectory(dir) => eyre!(Error::InputDirMissing(dir)),
        other => eyre!(other),
    })?;

    fs::create_dir_all(&global.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            global.output_dir.display()
        )
    })?;

    log::debug!(
        "Found {} PDF file(s) in {}",
        files.len(),
        global.input_dir.display()
    );

    let mut summary = RunSummary::default();

    for path in files {
        let name = display_name(&path);

        if !global.quiet {
            println!("Processing: {}", name);
        }

        match process_file(&path, &global.output_dir) {
            Ok(output_path) => {
                if !global.quiet {
                    println!("Output written to: {}", output_path.display());
                }
                summary.written.push(output_path);
            }
            Err(err) if global.fail_fast => return Err(err),
            Err(err) => {
                log::error!("{}: {:#}", name, err);
                eprintln!("{} {}: {:#}", "Failed:".red().bold(), name, err);
                summary.failed.push((path, format!("{:#}", err)));
            }
        }
    }

    Ok(summary)
}

/// Read, extract and write the outline for one PDF. Returns the JSON path.
pub fn process_file(path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if log::log_enabled!(log::Level::Debug) {
        if let Ok(meta) = pdf::info(&bytes) {
            log::debug!(
                "{}: {} page(s), Info title {:?}, creator {:?}",
                path.display(),
                meta.page_count,
                meta.title,
                meta.creator
            );
        }
    }

    let result = outline_for_bytes(&bytes)
        .with_context(|| format!("Failed to extract outline from {}", path.display()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Not a file path: {}", path.display()))?;
    let output_path = output_dir.join(output_os_file_name(file_name));
    fs::write(&output_path, render_json(&result)?)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    Ok(output_path)
}

/// Parse PDF bytes and run the outline heuristics over their spans.
pub fn outline_for_bytes(bytes: &[u8]) -> Result<ExtractionResult> {
    let pages = pdf::extract_pages(bytes).map_err(|e| eyre!(e))?;

    let span_count: usize = pages.iter().map(Vec::len).sum();
    log::debug!("Extracted {} span(s) from {} page(s)", span_count, pages.len());

    let result = extract_outline(&pages);
    log::debug!(
        "Title {:?}, {} heading(s)",
        result.title,
        result.outline.len()
    );

    Ok(result)
}

/// Serialize a result with 2-space indentation.
pub fn render_json(result: &ExtractionResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize outline")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
