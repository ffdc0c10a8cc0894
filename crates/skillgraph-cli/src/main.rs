//! Effect-graph tools CLI.
//!
//! Provides the `skillgraph` binary with subcommands for working with
//! effect-graph JSON files: `validate` runs the structural validator and
//! prints every accumulated error; `compile` produces an execution plan,
//! prints the canonical hash and rendered instructions, and optionally
//! writes the serialized plan.
//!
//! Uses the same `skillgraph_codegen::compile()` pipeline as any embedding
//! game runtime, ensuring identical compilation behavior from both entry
//! points.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use skillgraph_check::validate;
use skillgraph_codegen::{compile, CompileError};
use skillgraph_core::EffectGraph;

/// Effect graph compiler and tools.
#[derive(Parser)]
#[command(name = "skillgraph", about = "Effect graph compiler and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate an effect-graph JSON file.
    Validate {
        /// Path to the graph JSON file.
        graph: PathBuf,
    },
    /// Compile an effect-graph JSON file to an execution plan.
    Compile {
        /// Path to the graph JSON file.
        graph: PathBuf,

        /// Write the serialized plan JSON here.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Validate { graph } => run_validate(&graph),
        Commands::Compile { graph, output } => run_compile(&graph, output.as_deref()),
    };
    process::exit(exit_code);
}

/// Exit codes: 0 = success, 1 = compile error, 2 = validation failure,
/// 3 = I/O error.
fn load_graph(path: &Path) -> Result<EffectGraph, i32> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("Error: failed to read '{}': {}", path.display(), error);
            return Err(3);
        }
    };
    match serde_json::from_str(&text) {
        Ok(graph) => Ok(graph),
        Err(error) => {
            eprintln!("Error: failed to parse '{}': {}", path.display(), error);
            Err(3)
        }
    }
}

fn run_validate(path: &Path) -> i32 {
    let graph = match load_graph(path) {
        Ok(graph) => graph,
        Err(code) => return code,
    };

    let result = validate(&graph);
    if result.is_valid() {
        println!(
            "OK: '{}' ({} node(s), {} edge(s))",
            graph.id,
            graph.node_count(),
            graph.edge_count()
        );
        return 0;
    }

    eprintln!("Validation failed with {} error(s):", result.errors().len());
    for error in result.errors() {
        eprintln!("  {error}");
    }
    2
}

fn run_compile(path: &Path, output: Option<&Path>) -> i32 {
    let graph = match load_graph(path) {
        Ok(graph) => graph,
        Err(code) => return code,
    };

    let (plan, node_map) = match compile(&graph) {
        Ok(compiled) => compiled,
        Err(CompileError::ValidationFailed(errors)) => {
            eprintln!("Validation failed with {} error(s):", errors.len());
            for error in &errors {
                eprintln!("  {error}");
            }
            return 2;
        }
        Err(error) => {
            eprintln!("Error: {error}");
            return 1;
        }
    };

    let layout = plan.layout();
    println!("plan hash: {:016x}", plan.hash());
    println!(
        "layout: {} number, {} entity, {} damage-spec slot(s)",
        layout.numbers, layout.entities, layout.damage_specs
    );
    for (index, op) in plan.ops().iter().enumerate() {
        println!("  {index:3}: {:<36} ; {}", op.to_string(), node_map[index]);
    }

    if let Some(output) = output {
        let json = match serde_json::to_string_pretty(&plan) {
            Ok(json) => json,
            Err(error) => {
                eprintln!("Error: failed to serialize plan: {error}");
                return 1;
            }
        };
        if let Err(error) = fs::write(output, json) {
            eprintln!("Error: failed to write '{}': {}", output.display(), error);
            return 3;
        }
        println!("plan written to '{}'", output.display());
    }

    0
}
