//! Command implementations for the CLI tool.

use std::path::Path;

use iso_archiver::{
    Error, FileMapping, MergePolicy, Reader, TransformOptions, create_iso_with, extract_iso_with,
    patch_iso_with,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{ListSummary, create_formatter};
use crate::progress::CliProgress;

/// Configuration for the create command.
pub struct CreateConfig<'a> {
    pub out: &'a Path,
    pub base_dir: &'a Path,
    pub options: &'a [String],
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Configuration for the patch command.
pub struct PatchConfig<'a> {
    pub source: &'a Path,
    pub out: &'a Path,
    pub base_dir: &'a Path,
    pub options: &'a [String],
    pub replace: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

fn fail(message: &str, error: &Error) -> ExitCode {
    eprintln!("Error: {}: {}", message, error);
    error_to_exit_code(error)
}

fn collect_files(base_dir: &Path) -> Result<FileMapping, ExitCode> {
    if !base_dir.is_dir() {
        eprintln!("Error: base dir {} is not a directory", base_dir.display());
        return Err(ExitCode::BadArgs);
    }
    FileMapping::from_dir(base_dir).map_err(|e| fail("cannot locate files in base dir", &e))
}

/// Create command implementation
pub fn create(config: &CreateConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);
    let mapping = match collect_files(config.base_dir) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let options = TransformOptions::new().directives(config.options);
    let mut progress = CliProgress::new(config.quiet || config.format == OutputFormat::Json);
    progress.set_message("Creating...");

    match create_iso_with(config.out, &mapping, &options, &mut progress) {
        Ok(result) => {
            progress.finish();
            print!(
                "{}",
                formatter.format_patch_result(&config.out.display().to_string(), &result)
            );
            ExitCode::Success
        }
        Err(e) => {
            progress.finish_with_message("Failed");
            fail("cannot create ISO", &e)
        }
    }
}

/// Patch command implementation
pub fn patch(config: &PatchConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);
    let mapping = match collect_files(config.base_dir) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let policy = if config.replace {
        MergePolicy::Replace
    } else {
        MergePolicy::Append
    };
    let options = TransformOptions::new()
        .directives(config.options)
        .merge_policy(policy);
    let mut progress = CliProgress::new(config.quiet || config.format == OutputFormat::Json);
    progress.set_message("Patching...");

    match patch_iso_with(config.source, config.out, &mapping, &options, &mut progress) {
        Ok(result) => {
            progress.finish();
            print!(
                "{}",
                formatter.format_patch_result(&config.out.display().to_string(), &result)
            );
            ExitCode::Success
        }
        Err(e) => {
            progress.finish_with_message("Failed");
            fail("cannot patch ISO", &e)
        }
    }
}

/// Extract command implementation
pub fn extract(source: &Path, out: &Path, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);

    if let Err(e) = std::fs::create_dir_all(out) {
        eprintln!("Error creating output directory: {}", e);
        return ExitCode::IoError;
    }

    let mut progress = CliProgress::new(quiet || format == OutputFormat::Json);
    progress.set_message("Extracting...");

    match extract_iso_with(source, out, &mut progress) {
        Ok(result) => {
            progress.finish();
            print!("{}", formatter.format_extract_result(&result));
            ExitCode::Success
        }
        Err(e) => {
            progress.finish_with_message("Failed");
            fail("cannot extract ISO", &e)
        }
    }
}

/// List command implementation
pub fn list(archive: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let mut reader = match Reader::open(archive) {
        Ok(r) => r,
        Err(e) => return fail("cannot open archive", &e),
    };

    let mut entries = Vec::new();
    loop {
        match reader.next_entry() {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => break,
            Err(e) => return fail("cannot read archive", &e),
        }
    }

    let mut layers = reader.filters();
    layers.push(reader.format_name().unwrap_or_else(|| "empty archive".to_string()));
    let summary = ListSummary {
        source: reader.source(),
        format: layers.join(" > "),
    };
    print!("{}", formatter.format_list(&summary, &entries));
    reader.close();

    ExitCode::Success
}
