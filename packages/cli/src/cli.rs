//! Command-line interface for layersplit.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use layersplit_engine::memory::InMemoryModel;
use layersplit_engine::model::BimModel;
use layersplit_engine::splitting::{
    LayerAnalyzer, LayerSelection, SplitOrchestrator, SplitRequest, SplitState,
};
use layersplit_engine::types::ElementId;
use layersplit_engine::{SplitConfig, SplitError};

use crate::error::{CliError, Result};
use crate::report::{OutcomeReport, PlanReport, StackReport};

/// LayerSplit - split composite walls into single-layer walls.
#[derive(Parser)]
#[command(name = "layersplit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the layer stack of a wall.
    Inspect {
        /// Model document (YAML)
        model: PathBuf,

        /// Id of the wall to inspect
        #[arg(short, long)]
        wall: u64,

        /// Split configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Split a wall into one wall per layer.
    Split {
        /// Model document (YAML)
        model: PathBuf,

        /// Id of the wall to split
        #[arg(short, long)]
        wall: u64,

        /// Layers to extract, numbered from 1 on the exterior side (default: all)
        #[arg(short, long, value_delimiter = ',')]
        layers: Vec<usize>,

        /// Split configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the resulting model (default: <model>.split.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only compute and print the plan
        #[arg(long)]
        dry_run: bool,

        /// Print the plan or outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    execute(Cli::parse())
}

/// Execute parsed arguments.
pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect {
            model,
            wall,
            config,
        } => inspect_command(&model, ElementId(wall), config.as_deref()),
        Commands::Split {
            model,
            wall,
            layers,
            config,
            output,
            dry_run,
            json,
        } => {
            let options = SplitOptions {
                layers,
                config,
                output,
                dry_run,
                json,
            };
            split_command(&model, ElementId(wall), &options)
        }
    }
}

struct SplitOptions {
    layers: Vec<usize>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
    json: bool,
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CliError::io(path, e))
}

fn load_model(path: &Path) -> Result<InMemoryModel> {
    let model = InMemoryModel::from_yaml(&read_file(path)?)?;
    tracing::debug!(
        path = %path.display(),
        walls = model.wall_count(),
        wall_types = model.wall_type_count(),
        "Loaded model"
    );
    Ok(model)
}

fn load_config(path: Option<&Path>) -> Result<SplitConfig> {
    match path {
        Some(path) => Ok(SplitConfig::from_yaml(&read_file(path)?)?),
        None => Ok(SplitConfig::default()),
    }
}

/// Turn 1-based layer numbers into a selection. An empty list selects all.
pub fn parse_selection(layers: &[usize]) -> Result<LayerSelection> {
    if layers.is_empty() {
        return Ok(LayerSelection::all());
    }
    if let Some(&zero) = layers.iter().find(|&&n| n == 0) {
        return Err(CliError::InvalidLayer(zero));
    }
    Ok(LayerSelection::only(layers.iter().map(|n| n - 1)))
}

/// Output path used when none is given: `walls.yaml` becomes `walls.split.yaml`.
#[must_use]
pub fn default_output(model: &Path) -> PathBuf {
    let stem = model
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    model.with_file_name(format!("{stem}.split.yaml"))
}

/// Execute the inspect command.
fn inspect_command(model_path: &Path, wall: ElementId, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let model = load_model(model_path)?;

    let lookup = |e| SplitError::model(SplitState::Analyzing, e);
    let wall = model.wall(wall).map_err(lookup)?;
    let wall_type = model.wall_type(wall.type_id).map_err(lookup)?;
    let stack = LayerAnalyzer::new(&config).analyze(&wall, &wall_type)?;

    print!("{}", StackReport(&stack));
    Ok(())
}

/// Execute the split command.
fn split_command(model_path: &Path, wall: ElementId, options: &SplitOptions) -> Result<()> {
    let config = load_config(options.config.as_deref())?;
    let mut model = load_model(model_path)?;
    let request = SplitRequest::new(wall).with_selection(parse_selection(&options.layers)?);
    let mut orchestrator = SplitOrchestrator::new(config)?;

    if options.dry_run {
        let plan = orchestrator.plan_split(&model, &request)?;
        if options.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{}", PlanReport(&plan));
        }
        return Ok(());
    }

    let outcome = orchestrator.split(&mut model, &request)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!(
            "{}",
            OutcomeReport {
                outcome: &outcome,
                model: &model,
            }
        );
    }

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(model_path));
    let yaml = model.into_document().to_yaml()?;
    fs::write(&output, yaml).map_err(|e| CliError::io(&output, e))?;
    tracing::info!(path = %output.display(), "Wrote split model");

    if !options.json {
        println!();
        println!("{} {}", style("Saved to:").green().bold(), output.display());
    }
    Ok(())
}
