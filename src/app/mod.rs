use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Vec2};

use commit_constellation::data::{DataProvider, JsonFileProvider, StaticProvider, fetch_all};
use commit_constellation::graph::{Graph, build_from};
use commit_constellation::interaction::DragController;
use commit_constellation::physics::{Simulation, SimulationConfig};
use commit_constellation::render::Scene;
use commit_constellation::style::{GraphStyle, StyleConfig};

mod graph;
mod render_utils;
mod ui;

#[derive(Clone, Debug)]
pub enum DataSource {
    Demo,
    File(PathBuf),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Demo => f.write_str("built-in sample"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything the background loader hands back to the UI thread.
struct LoadedData {
    provider: Arc<dyn DataProvider>,
    graph: Graph,
    skipped_records: usize,
}

pub struct ConstellationApp {
    source: DataSource,
    simulation_config: SimulationConfig,
    style_config: StyleConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedData, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    provider: Arc<dyn DataProvider>,
    scene: Scene,
    simulation: Simulation,
    simulation_config: SimulationConfig,
    style_config: StyleConfig,
    drag: DragController,
    dragged: Option<String>,
    skipped_records: usize,
    /// Canvas size the simulation was built for.
    canvas: Vec2,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<String>,
    hovered: Option<String>,
    pan: Vec2,
    zoom: f32,
    steps_per_frame: usize,
    status: Option<String>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<HashSet<String>>,
}

impl ConstellationApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: DataSource,
        simulation_config: SimulationConfig,
        style_config: StyleConfig,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            simulation_config,
            style_config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource) -> Receiver<Result<LoadedData, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_data(&source).map_err(|error| {
                tracing::warn!(%source, "loading failed: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, loaded: LoadedData) -> AppState {
        match ViewModel::new(loaded, self.simulation_config.clone(), self.style_config.clone()) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => AppState::Error(format!("{error:#}")),
        }
    }
}

fn load_data(source: &DataSource) -> anyhow::Result<LoadedData> {
    let (provider, skipped_records): (Arc<dyn DataProvider>, usize) = match source {
        DataSource::Demo => (Arc::new(StaticProvider::sample()), 0),
        DataSource::File(path) => {
            let provider = JsonFileProvider::open(path)
                .with_context(|| format!("failed to open data document {}", path.display()))?;
            let skipped = provider.skipped_records();
            (Arc::new(provider), skipped)
        }
    };

    let data = fetch_all(provider.as_ref()).context("failed to fetch graph data")?;
    let graph = build_from(&data).context("failed to build graph")?;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        dropped = graph.report().total_dropped(),
        skipped_records,
        "graph loaded"
    );

    Ok(LoadedData {
        provider,
        graph,
        skipped_records,
    })
}

impl ViewModel {
    fn new(
        loaded: LoadedData,
        simulation_config: SimulationConfig,
        style_config: StyleConfig,
    ) -> anyhow::Result<Self> {
        let style = GraphStyle::compute(&loaded.graph, &style_config);
        let simulation = Simulation::for_graph(&loaded.graph, &style.radii(), simulation_config.clone())
            .context("failed to initialize layout")?;
        let canvas = Vec2::new(simulation_config.width, simulation_config.height);

        Ok(Self {
            provider: loaded.provider,
            scene: Scene::new(loaded.graph, style),
            simulation,
            simulation_config,
            style_config,
            drag: DragController::new(),
            dragged: None,
            skipped_records: loaded.skipped_records,
            canvas,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            hovered: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            steps_per_frame: 1,
            status: None,
            visible_node_count: 0,
            visible_edge_count: 0,
        })
    }
}

impl eframe::App for ConstellationApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(result);
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading repositories and contributors...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph data");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
                if retry {
                    self.state = Self::start_load(self.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(loaded) => self.ready(loaded),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
