use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::config::LayoutConfig;
use crate::memory::GraphSnapshot;

use super::super::ViewModel;
use super::super::graph::Interaction;
use super::super::physics::Simulation;

impl ViewModel {
    pub(in crate::app) fn new(graph: GraphSnapshot, config: LayoutConfig, center: Vec2) -> Self {
        let mut simulation = Simulation::new(config.simulation, center);
        let frame = Rc::new(RefCell::new(simulation.snapshot()));
        let sink = Rc::clone(&frame);
        let listener = simulation.subscribe(move |snapshot| *sink.borrow_mut() = snapshot.clone());

        let mut model = Self {
            source: GraphSnapshot::default(),
            active: GraphSnapshot::default(),
            graph_revision: 0,
            simulation,
            interaction: Interaction::new(config.view),
            frame,
            listener: Some(listener),
            selected: None,
            search: String::new(),
            search_match_cache: None,
            min_edge_weight: 0.0,
            live_physics: true,
            fit_pending: true,
            apply_error: None,
            load_error: None,
            show_legend: true,
            show_fps_bar: false,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        };

        match model.apply_snapshot(graph) {
            Ok(()) => log::info!(
                "showing memory graph ({} nodes, {} edges)",
                model.active.node_count(),
                model.active.edge_count()
            ),
            Err(error) => log::warn!("initial graph rejected: {error}"),
        }
        model
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source_label: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Memory Graph Explorer");
                    ui.separator();
                    ui.label(format!("source: {source_label}"));
                    ui.label(format!("nodes: {}", self.active.node_count()));
                    ui.label(format!("edges: {}", self.active.edge_count()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit view").clicked() {
                        self.fit_pending = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.layout_status_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });

                for error in [&self.load_error, &self.apply_error].into_iter().flatten() {
                    ui.colored_label(egui::Color32::from_rgb(248, 113, 113), error.as_str());
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected != selected {
            log::debug!("selected {selected:?}");
            self.selected = selected;
        }
    }

    /// Releases gestures, stops the layout and detaches the render listener.
    pub(in crate::app) fn teardown(&mut self) {
        self.interaction.cancel(&mut self.simulation);
        if let Some(listener) = self.listener.take() {
            self.simulation.unsubscribe(listener);
        }
        self.simulation.teardown();
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.teardown();
    }
}
