use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::truncate_label;

use super::super::ViewModel;

const SEARCH_RESULT_ROWS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (label or id)")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the layout.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Type to highlight matching nodes, then click one to select it.");
        self.draw_search_results(ui);

        ui.separator();

        let weight_slider = ui
            .add(
                egui::Slider::new(&mut self.min_edge_weight, 0.0..=1.0)
                    .step_by(0.1)
                    .text("Min edge weight"),
            )
            .on_hover_text("Hide associations lighter than this weight.");
        if weight_slider.changed() {
            self.refilter();
        }

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Step the layout every frame while it is still moving.");
        ui.checkbox(&mut self.show_legend, "Show legend");
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.horizontal_wrapped(|ui| {
            if ui.button("Reheat").clicked() {
                let amount = self.simulation.config().reheat_alpha;
                self.simulation.reheat(amount);
            }
            if ui.button("Stop").clicked() {
                self.simulation.stop();
            }
            if ui.button("Resume").clicked() {
                self.simulation.start();
            }
            if ui
                .button("Settle now")
                .on_hover_text("Run the layout to rest without animating.")
                .clicked()
            {
                let steps = self.simulation.settle(1_000);
                log::debug!("settled in {steps} steps");
            }
        });

        ui.collapsing("Physics tuning", |ui| self.draw_physics_tuning(ui));
        ui.collapsing("View tuning", |ui| self.draw_view_tuning(ui));
    }

    fn draw_search_results(&mut self, ui: &mut Ui) {
        let query = self.search.trim();
        if query.is_empty() {
            return;
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut ranked = self
            .active
            .nodes
            .iter()
            .filter_map(|node| {
                let score = matcher
                    .fuzzy_match(&node.label, query)
                    .max(matcher.fuzzy_match(&node.id, query))?;
                Some((score, node.id.clone(), node.label.clone()))
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        if ranked.is_empty() {
            ui.label(RichText::new("No matching nodes.").weak());
            return;
        }

        let mut clicked = None;
        for (_, id, label) in ranked.iter().take(SEARCH_RESULT_ROWS) {
            let is_selected = self.selected.as_deref() == Some(id.as_str());
            if ui
                .selectable_label(is_selected, truncate_label(label, 40))
                .on_hover_text(id.as_str())
                .clicked()
            {
                clicked = Some(id.clone());
            }
        }
        if ranked.len() > SEARCH_RESULT_ROWS {
            ui.label(RichText::new(format!("{} more...", ranked.len() - SEARCH_RESULT_ROWS)).weak());
        }

        if clicked.is_some() {
            self.set_selected(clicked);
        }
    }

    fn draw_physics_tuning(&mut self, ui: &mut Ui) {
        let mut config = self.simulation.config();
        let mut changed = false;

        changed |= ui
            .add(egui::Slider::new(&mut config.charge_strength, -1_500.0..=0.0).text("Repulsion"))
            .on_hover_text("Many-body strength. More negative pushes nodes further apart.")
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut config.link_distance, 20.0..=400.0).text("Link distance"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut config.link_strength, 0.0..=1.0).text("Link strength"))
            .changed();
        changed |= ui
            .checkbox(&mut config.weight_scaled_links, "Scale springs by edge weight")
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut config.centering_strength, 0.0..=1.0)
                    .text("Centering"),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut config.velocity_decay, 0.0..=0.95)
                    .text("Velocity retention"),
            )
            .on_hover_text("Fraction of velocity kept after each step.")
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut config.alpha_decay, 0.9..=0.999)
                    .text("Cooling")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Per-step alpha multiplier. Higher values cool more slowly.")
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut config.steps_per_tick, 1..=16).text("Steps per frame"))
            .changed();

        let mut barnes_hut = config.barnes_hut_theta.is_some();
        if ui
            .checkbox(&mut barnes_hut, "Barnes-Hut repulsion")
            .on_hover_text("Approximate far-away nodes with a quadtree. Useful for large graphs.")
            .changed()
        {
            config.barnes_hut_theta = barnes_hut.then_some(0.9);
            changed = true;
        }
        if let Some(theta) = config.barnes_hut_theta.as_mut() {
            changed |= ui
                .add(egui::Slider::new(theta, 0.3..=1.5).text("Opening angle"))
                .changed();
        }

        if changed {
            self.simulation.set_config(config);
            self.simulation.reheat(config.reheat_alpha);
        }
    }

    fn draw_view_tuning(&mut self, ui: &mut Ui) {
        let mut config = self.interaction.config();
        let mut changed = false;

        changed |= ui
            .add(egui::Slider::new(&mut config.min_scale, 0.05..=1.0).text("Min zoom"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut config.max_scale, 1.0..=10.0).text("Max zoom"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut config.drag_alpha, 0.0..=1.0).text("Drag heat"))
            .on_hover_text("Alpha held while a node is dragged.")
            .changed();

        if changed {
            self.interaction.set_config(config);
        }
    }
}
