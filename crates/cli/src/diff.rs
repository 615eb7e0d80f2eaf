//! CLI diff subcommand.

use std::path::PathBuf;
use std::process;

use chainkit_diff::{diff_request, diff_with_options, DiffOptions, DiffRequest, EntityDifferenceResult};

use crate::{block_on, load_graph, open_repository, print_json, report_error, OutputFormat};

/// Where the two graphs come from.
pub(crate) enum DiffSource {
    Files { left: PathBuf, right: PathBuf },
    Repository { repo: PathBuf, request: DiffRequest },
}

/// Diff two graphs. Exits 1 when they differ, like `diff(1)`.
pub(crate) fn cmd_diff(source: DiffSource, options: &DiffOptions, output: OutputFormat, quiet: bool) {
    if !(0.0..=1.0).contains(&options.min_similarity) {
        report_error("--min-similarity must be between 0.0 and 1.0", output, quiet);
        process::exit(1);
    }

    let result = match source {
        DiffSource::Files { left, right } => {
            let left = load_graph(&left, output, quiet);
            let right = load_graph(&right, output, quiet);
            diff_with_options(&left, &right, options)
        }
        DiffSource::Repository { repo, request } => {
            let repo = open_repository(&repo, output, quiet);
            match block_on(diff_request(&repo, &request, options), output, quiet) {
                Ok(result) => result,
                Err(e) => {
                    report_error(&format!("diff error: {}", e), output, quiet);
                    process::exit(1);
                }
            }
        }
    };

    print_result(&result, output, quiet);
    if !result.is_empty() {
        process::exit(1);
    }
}

fn print_result(result: &EntityDifferenceResult, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&result.to_json()),
        OutputFormat::Text if result.is_empty() && result.warnings.is_empty() => {
            println!("no differences");
        }
        OutputFormat::Text => println!("{}", result.to_text()),
    }
}
