use clap::{Parser, Subcommand};
use labflow::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Validates, orders and compiles laboratory workflow graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the validation report for an editor graph
    Validate {
        graph_path: String,
        /// Parameter schemas JSON (defaults to the built-in laboratory schemas)
        #[arg(long)]
        schemas: Option<String>,
    },
    /// Print the execution order and parallel levels of an editor graph
    Order { graph_path: String },
    /// Validate, order and compile an editor graph into an execution plan
    Compile {
        graph_path: String,
        /// Plan name
        #[arg(short, long, default_value = "workflow")]
        name: String,
        /// Planner configuration JSON
        #[arg(short, long)]
        config: Option<String>,
        /// Parameter schemas JSON (defaults to the built-in laboratory schemas)
        #[arg(long)]
        schemas: Option<String>,
        /// Extra plan tag, repeatable
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Write the plan here instead of printing it
        #[arg(short, long)]
        out: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { graph_path, schemas } => run_validate(&graph_path, schemas.as_deref()),
        Command::Order { graph_path } => run_order(&graph_path),
        Command::Compile {
            graph_path,
            name,
            config,
            schemas,
            tags,
            out,
        } => run_compile(
            &graph_path,
            &name,
            config.as_deref(),
            schemas.as_deref(),
            tags,
            out.as_deref(),
        ),
    }
}

fn load_schemas(path: Option<&str>) -> Arc<SchemaRegistry> {
    let registry = match path {
        Some(path) => SchemaRegistry::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load schemas: {}", e))),
        None => SchemaRegistry::laboratory(),
    };
    Arc::new(registry)
}

fn load_graph(path: &str) -> GraphModel {
    EditorGraph::from_file(path)
        .and_then(IntoGraph::into_graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load graph: {}", e)))
}

fn print_json(json: std::result::Result<String, impl std::fmt::Display>) {
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize output: {}", e)),
    }
}

fn run_validate(graph_path: &str, schemas: Option<&str>) {
    let snapshot = load_graph(graph_path).snapshot();
    let engine = ValidationEngine::builder().with_schemas(load_schemas(schemas)).build();
    let report = engine.validate(&snapshot);
    print_json(report.to_json());
    if !report.is_valid {
        std::process::exit(1);
    }
}

fn run_order(graph_path: &str) {
    let snapshot = load_graph(graph_path).snapshot();
    let order = TopologicalScheduler::order(&snapshot)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let levels = TopologicalScheduler::levels(&snapshot)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    println!("Execution order:");
    for (position, id) in order.iter().enumerate() {
        println!("  {:>3}. {}", position + 1, id);
    }
    println!("Parallel levels:");
    for (level, ids) in levels.iter().enumerate() {
        println!("  {:>3}: {}", level, ids.join(", "));
    }
}

fn run_compile(
    graph_path: &str,
    name: &str,
    config: Option<&str>,
    schemas: Option<&str>,
    tags: Vec<String>,
    out: Option<&str>,
) {
    let start = Instant::now();
    let config = match config {
        Some(path) => PlannerConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => PlannerConfig::default(),
    };

    let snapshot = load_graph(graph_path).snapshot();
    let report = ValidationEngine::builder()
        .with_schemas(load_schemas(schemas))
        .build()
        .validate(&snapshot);
    for warning in &report.warnings {
        eprintln!("{:?} {:?}: {}", warning.severity, warning.kind, warning.message);
    }
    if !report.is_valid {
        for error in &report.errors {
            eprintln!("{:?} {:?}: {}", error.severity, error.kind, error.message);
        }
        exit_with_error(&format!("Graph is invalid ({} error(s))", report.errors.len()));
    }

    let order = TopologicalScheduler::order(&snapshot)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let plan = PlanCompiler::builder(name)
        .with_config(&config)
        .with_tags(tags)
        .build()
        .compile(&snapshot, &order)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    info!(tasks = plan.tasks.len(), elapsed = ?start.elapsed(), "compiled plan");

    match out {
        Some(path) => {
            plan.save(path)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to write plan: {}", e)));
            println!("Plan '{}' written to {}", plan.name, path);
        }
        None => print_json(plan.to_json()),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
