//! # labflow - Workflow Graph Compiler and Execution Planner
//!
//! **labflow** takes an authored graph of laboratory operation nodes and
//! connections, validates its structure, orders it deterministically, and
//! compiles it into a portable execution plan (tasks, a dependency map and
//! retry settings) for an external runner.
//!
//! ## Core Workflow
//!
//! 1.  **Load the Graph**: Parse the editor's JSON into an `EditorGraph`, or implement
//!     `IntoGraph` for your own format.
//! 2.  **Validate**: Run a `ValidationEngine` over a `GraphSnapshot`. Only a result with
//!     `is_valid` may be compiled.
//! 3.  **Order**: `TopologicalScheduler::order` yields a deterministic topological order.
//! 4.  **Compile**: `PlanCompiler` turns the snapshot and order into an `ExecutionPlan`.
//! 5.  **Run**: The runner starts root tasks concurrently and wraps every task in a
//!     `RetryCoordinator`. Conditional edges are resolved with the `ConditionEvaluator`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let graph = EditorGraph::from_file("workflow.json")?.into_graph()?;
//!     let snapshot = graph.snapshot();
//!
//!     let report = ValidationEngine::builder()
//!         .with_schemas(std::sync::Arc::new(SchemaRegistry::laboratory()))
//!         .build()
//!         .validate(&snapshot);
//!     if !report.is_valid {
//!         for issue in &report.errors {
//!             eprintln!("{:?}: {}", issue.kind, issue.message);
//!         }
//!         return Ok(());
//!     }
//!
//!     let order = TopologicalScheduler::order(&snapshot)?;
//!     let plan = PlanCompiler::builder("synthesis").build().compile(&snapshot, &order)?;
//!     plan.save("plan.json")?;
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod condition;
pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod prelude;
pub mod retry;
pub mod scheduler;
pub mod schema;
pub mod validation;
pub mod value;
