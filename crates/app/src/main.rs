mod script;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use graph_layout::LayeredLayout;
use layerwerk_incremental::{CoordinatorConfig, LayoutCoordinator};
use script::{Script, Session, DEFAULT_SCRIPT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Replay an editing session against the incremental layout coordinator
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RON script of editing steps, the sample graph when omitted
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Give up on a layout pass after this many milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    layout: LayeredLayout,
    coordinator: CoordinatorConfig,
    timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            layout: LayeredLayout::default(),
            coordinator: CoordinatorConfig::default(),
            timeout_ms: 5000,
        }
    }
}

impl AppConfig {
    fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        ron::from_str(&source).with_context(|| format!("Invalid config {}", path.display()))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    debug!("Using {config:?}");

    let script = match &args.script {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read script {}", path.display()))?;
            Script::parse(&source)?
        }
        None => Script::parse(DEFAULT_SCRIPT)?,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot start the runtime")?;

    rt.block_on(async {
        let coordinator = LayoutCoordinator::layered(config.layout, config.coordinator);
        let mut session = Session::new(coordinator, Duration::from_millis(config.timeout_ms));
        session.run(&script).await?;

        info!("Replayed {} steps", script.steps.len());
        for (name, layer, position) in session.summary().await {
            let layer = layer.map_or("-".to_string(), |l| l.to_string());
            match position {
                Some(p) => println!("{name:<12} layer {layer:>4}  at ({:.1}, {:.1})", p.0.x, p.0.y),
                None => println!("{name:<12} layer {layer:>4}  not placed"),
            }
        }
        Ok(())
    })
}
