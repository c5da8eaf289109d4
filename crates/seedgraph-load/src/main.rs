//! CLI entry point for the seedgraph loader.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use seedgraph_graph::GraphClient;

use seedgraph_load::config::{graph_config, load_settings, LoadConfig};
use seedgraph_load::input::LoadInput;
use seedgraph_load::pipeline::{LoadPipeline, LoadReport};

#[derive(Parser)]
#[command(name = "seedgraph-load")]
#[command(about = "Seed a Neo4j graph from JSON node and relationship files")]
struct Cli {
    /// Schema file with per-label unique properties.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Node file (object of label -> list of property maps).
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Relationship file (list of relationship descriptors).
    #[arg(long)]
    relationships: Option<PathBuf>,

    /// Only load nodes with this label. Repeatable.
    #[arg(short, long = "label")]
    labels: Vec<String>,

    /// Skip uniqueness constraint creation.
    #[arg(long)]
    skip_constraints: bool,

    /// Print the statements a run would issue and exit without connecting.
    #[arg(long)]
    dry_run: bool,

    /// Print the load report as JSON.
    #[arg(long)]
    json: bool,

    /// Config file prefix (default: seedgraph).
    #[arg(short, long, default_value = "seedgraph")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;
    let load_config = apply_overrides(LoadConfig::from_settings(&settings)?, &cli);

    let input = LoadInput::read(&load_config)?;
    let pipeline = LoadPipeline::new(load_config)?;

    if cli.dry_run {
        for statement in pipeline.plan(&input)? {
            println!("{}", statement.text());
            if !statement.params().is_empty() {
                println!("  {}", serde_json::to_string(statement.params())?);
            }
        }
        return Ok(());
    }

    let graph = GraphClient::connect(&graph_config(&settings)?).await?;

    let report = pipeline.run(&graph, &input).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &LoadReport) {
    if report.constraints > 0 {
        println!("Ensured {} uniqueness constraints", report.constraints);
    }
    for (label, count) in &report.nodes_by_label {
        println!("Created {count} {label} nodes");
    }
    println!("Created {} relationships", report.relationships);
}

fn apply_overrides(mut config: LoadConfig, cli: &Cli) -> LoadConfig {
    if let Some(path) = &cli.schema {
        config.schema_path = path.clone();
    }
    if let Some(path) = &cli.nodes {
        config.nodes_path = path.clone();
    }
    if let Some(path) = &cli.relationships {
        config.relationships_path = path.clone();
    }
    if !cli.labels.is_empty() {
        config.labels = cli.labels.clone();
    }
    if cli.skip_constraints {
        config.create_constraints = false;
    }
    config
}
