//! Veriline CLI - Schema-driven Text Validation
//!
//! This is a demonstration CLI for the Veriline library.

use anyhow::Context;
use veriline::prelude::*;
use veriline::NAME;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }

    match args[1].as_str() {
        "list" => list_operations(),
        "info" => {
            if args.len() < 3 {
                eprintln!("Error: Please specify an operation name");
                return Ok(());
            }
            operation_info(&args[2]);
        }
        "grammar" => print!("{}", schema_grammar()),
        "check" => {
            if args.len() < 4 {
                eprintln!("Error: Please specify schema and input paths");
                eprintln!("Usage: {} check <schema.json> <input> [--json]", args[0]);
                std::process::exit(2);
            }
            let as_json = args.iter().any(|a| a == "--json");
            check(&args[2], &args[3], as_json)?;
        }
        "help" | "--help" | "-h" => print_usage(&args[0]),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage(&args[0]);
        }
    }
    Ok(())
}

fn print_usage(program: &str) {
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                      List all available operations");
    println!("  info <operation>          Show detailed info about an operation");
    println!("  grammar                   Print the parameter schema grammar");
    println!("  check <schema> <input>    Check an input file against a schema");
    println!("  help                      Show this help message");
    println!();
    println!("Check options:");
    println!("  --json                    Print the full report as JSON");
}

fn list_operations() {
    let registry = OperationRegistry::with_builtins();
    let lookups = LookupRegistry::with_builtins();

    println!("Available operations ({} total):", registry.len());
    println!();
    for kind in [
        OperationKind::Rule,
        OperationKind::Validator,
        OperationKind::Assertion,
    ] {
        println!("  {}s", kind.display_name());
        for name in registry.by_kind(kind) {
            if let Some(entry) = registry.get(name) {
                println!("      • {} - {}", name, entry.summary);
            }
        }
        println!();
    }

    println!("  Lookups (resolved by key name)");
    for name in lookups.names() {
        println!("      • {}", name);
    }
}

fn operation_info(name: &str) {
    let registry = OperationRegistry::with_builtins();
    match registry.get(name) {
        Some(entry) => {
            println!("{} ({})", name, entry.kind.display_name());
            println!("  {}", entry.summary);
            match &entry.schema {
                Some(schema) if !schema.is_empty() => {
                    println!();
                    println!("Parameters:");
                    print!("{}", schema.describe());
                }
                _ => {
                    println!();
                    println!("No parameters.");
                }
            }
        }
        None => {
            eprintln!("Unknown operation: {}", name);
            eprintln!("Run '{} list' to see available operations", NAME);
        }
    }
}

fn check(schema_path: &str, input_path: &str, as_json: bool) -> anyhow::Result<()> {
    let runner = CheckRunner::new();
    let report = runner
        .check_file(schema_path, input_path)
        .with_context(|| format!("checking {} against {}", input_path, schema_path))?;

    if as_json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.summary());
        for failure in report.detailed_failures() {
            println!("  {}", failure);
        }
        println!();
        println!(
            "{} record(s), {} failure(s), {} ms",
            report.records, report.failures, report.duration_ms
        );
    }

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}
