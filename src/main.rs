mod app;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use commit_constellation::physics::SimulationConfig;
use commit_constellation::style::StyleConfig;

use app::{ConstellationApp, DataSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON document with `repositories`, `users`, `relationships` and optional `profiles`.
    #[arg(long, conflicts_with = "demo", required_unless_present = "demo")]
    data: Option<PathBuf>,
    /// Use the built-in sample data instead of a file.
    #[arg(long)]
    demo: bool,
    /// JSON simulation config; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_steps: Option<usize>,
    #[arg(long)]
    timeout_secs: Option<f32>,
}

impl Args {
    fn simulation_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)
                .with_context(|| format!("failed to load simulation config {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.max_duration_secs = Some(timeout_secs);
        }
        Ok(config.sanitized())
    }

    fn source(&self) -> DataSource {
        match &self.data {
            Some(path) if !self.demo => DataSource::File(path.clone()),
            _ => DataSource::Demo,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let simulation_config = args.simulation_config()?;
    let source = args.source();
    tracing::info!(?source, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "commit constellation",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ConstellationApp::new(
                cc,
                source,
                simulation_config,
                StyleConfig::default(),
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}
