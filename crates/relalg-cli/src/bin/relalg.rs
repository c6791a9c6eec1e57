//! relalg CLI
//!
//! A thin wrapper around the relalg library.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use relalg::{Catalog, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TREE_DEPTH, ParseContext};

#[derive(Parser)]
#[command(name = "relalg")]
#[command(about = "Parse and evaluate relational algebra expressions")]
#[command(after_help = "\
EXAMPLES:
    # Show the parsed form of an expression
    relalg 'select_ {A > 2} (R union S)'

    # Evaluate against files; each file is a relation named after its stem
    relalg 'U join_ V' data/U.csv data/V.csv

    # Load every csv/parquet/ipc file in a directory
    relalg --tree 'project_ {A,C} (R minus S)' ./data/
")]
struct Args {
    /// Relational algebra expression, with symbols or aliases
    expression: String,

    /// Paths to parquet/csv/ipc files or directories
    paths: Vec<PathBuf>,

    /// Log every parser step
    #[arg(long)]
    trace: bool,

    /// Reject relation names that were not loaded from PATHS
    #[arg(long)]
    strict: bool,

    /// Print the expression as an indented tree
    #[arg(long)]
    tree: bool,

    /// Print the AST as JSON
    #[arg(long)]
    json: bool,

    /// Maximum parenthesis nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum height of the expression tree, operator chains included
    #[arg(long, default_value_t = DEFAULT_MAX_TREE_DEPTH)]
    max_tree_depth: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.trace { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let catalog = if args.paths.is_empty() {
        Catalog::new()
    } else {
        relalg_cli::loader::load_catalog(&args.paths)
    };
    if !args.paths.is_empty() && catalog.is_empty() {
        anyhow::bail!("no relations could be loaded from the given paths");
    }

    let mut ctx = ParseContext::new()
        .with_trace(args.trace)
        .with_max_depth(args.max_depth)
        .with_max_tree_depth(args.max_tree_depth);
    if args.strict {
        ctx = ctx.with_relations(&catalog);
    }

    let symbolized = relalg::symbolize(&args.expression);
    log::debug!("symbolized: {}", symbolized);
    let node = relalg::parse_with(&symbolized, &ctx)
        .with_context(|| format!("failed to parse '{}'", symbolized))?;

    println!("{}", node);
    if args.tree {
        print!("{}", relalg::pretty(&node));
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&node)?);
    }

    if catalog.is_empty() {
        return Ok(());
    }
    let df = relalg::eval(&node, &catalog).context("evaluation failed")?;
    println!("{}", df);

    Ok(())
}
