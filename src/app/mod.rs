use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::config::LayoutConfig;
use crate::memory::{GraphSnapshot, load_graph_snapshot, sample_graph};

mod graph;
mod physics;
mod render_utils;
mod ui;

pub(crate) use graph::ViewConfig;
pub(crate) use physics::SimulationConfig;

use graph::Interaction;
use physics::{ListenerId, PositionSnapshot, Simulation};

type LoadResult = Result<GraphSnapshot, String>;

pub struct MemoryGraphApp {
    graph_path: Option<PathBuf>,
    config: LayoutConfig,
    center: Vec2,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    /// Snapshot as loaded, before the edge weight filter.
    source: GraphSnapshot,
    /// Snapshot currently owned by the simulation.
    active: GraphSnapshot,
    graph_revision: u64,
    simulation: Simulation,
    interaction: Interaction,
    frame: Rc<RefCell<PositionSnapshot>>,
    listener: Option<ListenerId>,
    selected: Option<String>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    min_edge_weight: f32,
    live_physics: bool,
    fit_pending: bool,
    apply_error: Option<String>,
    load_error: Option<String>,
    show_legend: bool,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl MemoryGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        graph_path: Option<PathBuf>,
        config: LayoutConfig,
        canvas_size: Vec2,
    ) -> Self {
        let center = canvas_size * 0.5;
        let state = match &graph_path {
            Some(path) => AppState::Loading {
                rx: Self::spawn_load(path.clone()),
            },
            None => AppState::Ready(Box::new(ViewModel::new(sample_graph(), config, center))),
        };

        Self {
            graph_path,
            config,
            center,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph_snapshot(&path).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                log::warn!("{error}");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn source_label(&self) -> String {
        match &self.graph_path {
            Some(path) => path.display().to_string(),
            None => "built-in sample".to_owned(),
        }
    }

    fn start_load(&self) -> AppState {
        match &self.graph_path {
            Some(path) => AppState::Loading {
                rx: Self::spawn_load(path.clone()),
            },
            None => AppState::Ready(Box::new(ViewModel::new(
                sample_graph(),
                self.config,
                self.center,
            ))),
        }
    }
}

impl eframe::App for MemoryGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let source_label = self.source_label();

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(graph)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            graph,
                            self.config,
                            self.center,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading memory graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load memory graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    transition = Some(self.start_load());
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &source_label, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    match &self.graph_path {
                        Some(path) => self.reload_rx = Some(Self::spawn_load(path.clone())),
                        None => model.reload(Ok(sample_graph())),
                    }
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => model.reload(result),
                        Err(TryRecvError::Empty) => {
                            ctx.request_repaint();
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.reload(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
