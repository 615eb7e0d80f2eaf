mod bulk;
mod diff;
mod migrate;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process;

use chainkit_core::Graph;
use chainkit_storage::DirectoryRepository;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Chain graph diff and migration toolkit.
#[derive(Parser)]
#[command(name = "chainkit", version, about = "Chain graph diff and migration toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two chain graphs, from files or from a repository
    Diff {
        /// Left chain JSON file
        left: Option<PathBuf>,
        /// Right chain JSON file
        right: Option<PathBuf>,
        /// Resolve ids against this repository directory instead of files
        #[arg(long)]
        repo: Option<PathBuf>,
        #[arg(long, requires = "repo")]
        left_chain: Option<String>,
        #[arg(long, requires = "repo")]
        left_snapshot: Option<String>,
        #[arg(long, requires = "repo")]
        right_chain: Option<String>,
        #[arg(long, requires = "repo")]
        right_snapshot: Option<String>,
        /// Report canvas position changes
        #[arg(long)]
        positions: bool,
        /// Minimum property similarity for pairing renamed elements (0.0 to 1.0)
        #[arg(long, default_value = "0.5")]
        min_similarity: f64,
    },

    /// Replace deprecated element types in a chain
    Migrate {
        /// Chain JSON file
        chain: PathBuf,
        /// Rules file (TOML)
        #[arg(long)]
        rules: PathBuf,
        /// Write the migrated chain to this file
        #[arg(long)]
        write: Option<PathBuf>,
    },

    /// Show deprecation flags of a chain
    Inspect {
        /// Chain JSON file
        chain: PathBuf,
        /// Rules file (TOML)
        #[arg(long)]
        rules: PathBuf,
    },

    /// Delete chains from a repository, continuing past failures
    BulkDelete {
        /// Repository directory
        #[arg(long)]
        repo: PathBuf,
        /// Chain ids to delete
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Diff {
            left,
            right,
            repo,
            left_chain,
            left_snapshot,
            right_chain,
            right_snapshot,
            positions,
            min_similarity,
        } => {
            let options = chainkit_diff::DiffOptions {
                include_positions: positions,
                min_similarity,
            };
            let source = match (repo, left, right) {
                (Some(repo), None, None) => diff::DiffSource::Repository {
                    repo,
                    request: chainkit_diff::DiffRequest {
                        left_chain_id: left_chain,
                        left_snapshot_id: left_snapshot,
                        right_chain_id: right_chain,
                        right_snapshot_id: right_snapshot,
                    },
                },
                (None, Some(left), Some(right)) => diff::DiffSource::Files { left, right },
                _ => {
                    report_error(
                        "diff takes either two chain files or --repo with chain/snapshot ids",
                        cli.output,
                        cli.quiet,
                    );
                    process::exit(1);
                }
            };
            diff::cmd_diff(source, &options, cli.output, cli.quiet);
        }
        Commands::Migrate {
            chain,
            rules,
            write,
        } => {
            migrate::cmd_migrate(&chain, &rules, write.as_deref(), cli.output, cli.quiet);
        }
        Commands::Inspect { chain, rules } => {
            migrate::cmd_inspect(&chain, &rules, cli.output, cli.quiet);
        }
        Commands::BulkDelete { repo, ids } => {
            bulk::cmd_bulk_delete(&repo, &ids, cli.output, cli.quiet);
        }
    }
}

/// Log to stderr, filtered by `CHAINKIT_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("CHAINKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read and parse a chain JSON file, exiting on failure.
pub(crate) fn load_graph(path: &Path, output: OutputFormat, quiet: bool) -> Graph {
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str::<Graph>(&content) {
        Ok(g) => {
            tracing::debug!(
                path = %path.display(),
                elements = g.element_count(),
                connections = g.connection_count(),
                "chain loaded"
            );
            g
        }
        Err(e) => {
            let msg = format!("error parsing chain in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Open a repository directory, exiting if it does not exist.
pub(crate) fn open_repository(root: &Path, output: OutputFormat, quiet: bool) -> DirectoryRepository {
    if !root.is_dir() {
        let msg = format!("repository directory not found: {}", root.display());
        report_error(&msg, output, quiet);
        process::exit(1);
    }
    DirectoryRepository::new(root)
}

/// Run a repository future to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(future: F, output: OutputFormat, quiet: bool) -> F::Output {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };
    rt.block_on(future)
}

/// Print a JSON value, pretty.
pub(crate) fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
