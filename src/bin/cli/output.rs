//! Output formatting for CLI operations.

use iso_archiver::progress::format_bytes;
use iso_archiver::{Entry, ExtractResult, PatchResult, Timestamp};
use serde_json::json;

/// What `list` prints besides the entries.
pub struct ListSummary<'a> {
    pub source: &'a str,
    pub format: String,
}

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, summary: &ListSummary<'_>, entries: &[Entry]) -> String;

    /// Formats create and patch results
    fn format_patch_result(&self, out: &str, result: &PatchResult) -> String;

    /// Formats extraction results
    fn format_extract_result(&self, result: &ExtractResult) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, summary: &ListSummary<'_>, entries: &[Entry]) -> String {
        let mut output = String::new();
        output.push_str(&format!("{} ({})\n", summary.source, summary.format));
        output.push_str(&format!(
            "{:<10} {:>12} {:>19} {}\n",
            "Mode", "Size", "Modified", "Name"
        ));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let size_str = if entry.is_file() {
                file_count += 1;
                total_size += entry.size();
                entry.size().to_string()
            } else {
                if entry.is_dir() {
                    dir_count += 1;
                }
                String::new()
            };
            let mtime_str = entry
                .modified()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string());
            let name = match entry.link_target() {
                Some(target) => format!("{} -> {}", entry.path(), target),
                None => entry.path().to_string(),
            };
            output.push_str(&format!(
                "{:<10} {:>12} {:>19} {}\n",
                entry.mode_string(),
                size_str,
                mtime_str,
                name
            ));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} files, {} directories, {} total\n",
            file_count,
            dir_count,
            format_bytes(total_size)
        ));
        output
    }

    fn format_patch_result(&self, out: &str, result: &PatchResult) -> String {
        let mut output = format!(
            "Wrote {}: {} entries ({} copied, {} added",
            out,
            result.total_entries(),
            result.entries_copied,
            result.entries_injected
        );
        if result.entries_replaced > 0 {
            output.push_str(&format!(", {} replaced", result.entries_replaced));
        }
        output.push_str(&format!("), {}\n", format_bytes(result.image_size)));
        output
    }

    fn format_extract_result(&self, result: &ExtractResult) -> String {
        format!(
            "Extracted {} files ({}), skipped {} entries\n",
            result.entries_extracted,
            format_bytes(result.bytes_extracted),
            result.entries_skipped
        )
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, summary: &ListSummary<'_>, entries: &[Entry]) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "path": e.path(),
                    "type": e.file_type().name(),
                    "mode": format!("{:o}", e.permissions()),
                    "size": e.size(),
                    "uid": e.uid(),
                    "gid": e.gid(),
                    "modified": e.modified().map(|t| t.as_unix_secs()),
                    "link_target": e.link_target(),
                })
            })
            .collect();
        let obj = json!({
            "source": summary.source,
            "format": summary.format,
            "entries": items,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }

    fn format_patch_result(&self, out: &str, result: &PatchResult) -> String {
        let obj = json!({
            "output": out,
            "entries_copied": result.entries_copied,
            "entries_injected": result.entries_injected,
            "entries_replaced": result.entries_replaced,
            "bytes_written": result.bytes_written,
            "image_size": result.image_size,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }

    fn format_extract_result(&self, result: &ExtractResult) -> String {
        let obj = json!({
            "entries_extracted": result.entries_extracted,
            "entries_skipped": result.entries_skipped,
            "bytes_extracted": result.bytes_extracted,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string()) + "\n"
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Formats a timestamp as `YYYY-MM-DD hh:mm:ss` UTC
pub fn format_timestamp(time: Timestamp) -> String {
    let c = time.to_civil();
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        c.year, c.month, c.day, c.hour, c.minute, c.second
    )
}
