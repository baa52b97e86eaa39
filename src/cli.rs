use crate::config::{LayoutConfig, Viewport, load_config};
use crate::ir::{Direction, GraphDocument};
use crate::layout::{LayoutMode, compute_layout};
use crate::layout_dump::{write_json, write_layout_dump};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kgl", version, about = "Knowledge graph layout engine")]
pub struct Args {
    /// Input graph document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout path
    #[arg(short = 'm', long = "mode", value_enum, default_value = "hierarchical")]
    pub mode: ModeArg,

    /// Rank direction (TB, BT, LR, RL)
    #[arg(short = 'd', long = "direction", value_parser = parse_direction)]
    pub direction: Option<Direction>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width used to size hierarchy rows
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height used to size hierarchy levels
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Emit a summary dump (bounds, residual overlaps) instead of the bare layout
    #[arg(long = "summary")]
    pub summary: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Rank,
    Hierarchical,
}

impl From<ModeArg> for LayoutMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rank => LayoutMode::Rank,
            ModeArg::Hierarchical => LayoutMode::Hierarchical,
        }
    }
}

fn parse_direction(token: &str) -> Result<Direction, String> {
    token.parse::<Direction>().map_err(|err| err.to_string())
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    apply_overrides(&args, &mut config);

    let document = read_document(args.input.as_deref())?;
    let mode = LayoutMode::from(args.mode);
    tracing::info!(
        nodes = document.nodes.len(),
        edges = document.edges.len(),
        ?mode,
        "computing layout"
    );
    let result = compute_layout(&document, mode, &config);

    if args.summary {
        write_layout_dump(args.output.as_deref(), &result, mode, &config)?;
    } else {
        write_json(args.output.as_deref(), &result)?;
    }
    Ok(())
}

/// Command-line flags win over the config file.
fn apply_overrides(args: &Args, config: &mut LayoutConfig) {
    if let Some(direction) = args.direction {
        config.rank.direction = direction;
    }
    if args.width.is_some() || args.height.is_some() {
        let base = config.hierarchy.viewport_or_default();
        config.hierarchy.viewport = Some(Viewport {
            width: args.width.unwrap_or(base.width),
            height: args.height.unwrap_or(base.height),
        });
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_document(path: Option<&Path>) -> Result<GraphDocument> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(GraphDocument::from_path(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(GraphDocument::from_json(&buf)?)
}
