//! CLI bulk-delete subcommand.

use std::path::Path;
use std::process;

use chainkit_storage::bulk_delete;

use crate::{block_on, open_repository, print_json, report_error, OutputFormat};

/// Delete every listed chain. Exits 1 if any deletion failed, after
/// attempting all of them.
pub(crate) fn cmd_bulk_delete(root: &Path, ids: &[String], output: OutputFormat, quiet: bool) {
    let repo = open_repository(root, output, quiet);
    let report = block_on(bulk_delete(&repo, ids), output, quiet);

    if !quiet {
        match output {
            OutputFormat::Json => match serde_json::to_value(&report) {
                Ok(v) => print_json(&v),
                Err(e) => report_error(&format!("serialization error: {}", e), output, quiet),
            },
            OutputFormat::Text => println!("{}", report.to_text()),
        }
    }
    if !report.is_complete() {
        process::exit(1);
    }
}
