//! CLI migrate and inspect subcommands.
//!
//! Both read a chain JSON file and a TOML rules file. `migrate` prints the
//! migration report and optionally writes the migrated chain; the input
//! file is never modified unless `--write` names it.

use std::path::Path;
use std::process;

use chainkit_migration::{MigrationEngine, RulesConfig};

use crate::{load_graph, print_json, report_error, OutputFormat};

fn load_rules(path: &Path, output: OutputFormat, quiet: bool) -> RulesConfig {
    match RulesConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn cmd_migrate(
    chain_path: &Path,
    rules_path: &Path,
    write: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let graph = load_graph(chain_path, output, quiet);
    let config = load_rules(rules_path, output, quiet);
    let (rules, library) = (config.rule_table(), config.library());
    let engine = MigrationEngine::new(&rules, &library);

    let migrated = match engine.migrate(&graph) {
        Ok(m) => m,
        Err(e) => {
            report_error(&format!("migration error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if let Some(out_path) = write {
        let body = match serde_json::to_string_pretty(&migrated.chain) {
            Ok(s) => s,
            Err(e) => {
                report_error(&format!("serialization error: {}", e), output, quiet);
                process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(out_path, body + "\n") {
            let msg = format!("error writing '{}': {}", out_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&migrated.report.to_json()),
        OutputFormat::Text => {
            println!("{}", migrated.report.to_text());
            if let Some(out_path) = write {
                eprintln!("migrated chain written to {}", out_path.display());
            }
        }
    }
}

pub(crate) fn cmd_inspect(chain_path: &Path, rules_path: &Path, output: OutputFormat, quiet: bool) {
    let graph = load_graph(chain_path, output, quiet);
    let config = load_rules(rules_path, output, quiet);
    let (rules, library) = (config.rule_table(), config.library());
    let summary = MigrationEngine::new(&rules, &library).inspect(&graph);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "chain_id": graph.id(),
            "contains_deprecated_elements": summary.contains_deprecated_elements,
            "contains_unsupported_elements": summary.contains_unsupported_elements,
            "contains_deprecated_containers": summary.contains_deprecated_containers,
        })),
        OutputFormat::Text => {
            let flag = |b: bool| if b { "yes" } else { "no" };
            println!("chain {}", graph.id());
            println!(
                "  deprecated elements:   {}",
                flag(summary.contains_deprecated_elements)
            );
            println!(
                "  unsupported elements:  {}",
                flag(summary.contains_unsupported_elements)
            );
            println!(
                "  deprecated containers: {}",
                flag(summary.contains_deprecated_containers)
            );
        }
    }
}
