use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, RichText, Stroke, Ui, pos2, vec2};
use serde_json::Value;

use crate::memory::NodeKind;
use crate::util::truncate_label;

use super::super::ViewModel;
use super::super::render_utils::node_style;

const LEGEND_KINDS: [NodeKind; 3] = [NodeKind::Entity, NodeKind::Experience, NodeKind::Context];

fn property_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a node from the graph or the search results.");
            return;
        };

        let Some(node) = self.active.node(&selected_id) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(format!("id: {}", node.id));
        ui.horizontal(|ui| {
            let style = node_style(&node.kind);
            let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 5.0, style.fill);
            ui.label(node.kind.label());
        });

        if let Some(position) = self.simulation.position(&selected_id) {
            let pinned = if self.simulation.is_pinned(&selected_id) {
                " (pinned)"
            } else {
                ""
            };
            ui.label(format!("position: ({:.1}, {:.1}){pinned}", position.x, position.y));
        }

        ui.separator();
        ui.label(RichText::new("Properties").strong());
        if node.properties.is_empty() {
            ui.label(RichText::new("No properties.").weak());
        } else {
            egui::Grid::new("node_properties")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (key, value) in &node.properties {
                        ui.label(key.as_str());
                        ui.label(truncate_label(&property_text(value), 48));
                        ui.end_row();
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new("Associations").strong());

        let mut clicked = None;
        let incident = self.active.incident_edges(&selected_id).collect::<Vec<_>>();
        if incident.is_empty() {
            ui.label("No associations above the current weight threshold.");
        }
        egui::ScrollArea::vertical()
            .id_salt("associations_scroll")
            .max_height(320.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for edge in incident {
                    let (arrow, other_id) = if edge.source == selected_id {
                        ("->", edge.target.as_str())
                    } else {
                        ("<-", edge.source.as_str())
                    };
                    let other_label = self
                        .active
                        .node(other_id)
                        .map_or(other_id, |other| other.label.as_str());
                    let relation = if edge.label.is_empty() {
                        edge.id.as_str()
                    } else {
                        edge.label.as_str()
                    };

                    let text = format!(
                        "{arrow} {relation} {arrow} {}  ({:.2})",
                        truncate_label(other_label, 32),
                        edge.weight
                    );
                    if ui.link(text).on_hover_text(other_id).clicked() {
                        clicked = Some(other_id.to_owned());
                    }
                }
            });

        if clicked.is_some() {
            self.set_selected(clicked);
        }
    }

    pub(in crate::app) fn draw_legend(&self, painter: &Painter, rect: Rect) {
        if !self.show_legend {
            return;
        }

        let row_height = 18.0;
        let size = vec2(130.0, 12.0 + row_height * LEGEND_KINDS.len() as f32);
        let origin = pos2(rect.left() + 10.0, rect.bottom() - size.y - 10.0);
        let frame = Rect::from_min_size(origin, size);

        painter.rect_filled(frame, 6.0, Color32::from_rgba_unmultiplied(15, 23, 42, 220));
        painter.rect_stroke(
            frame,
            6.0,
            Stroke::new(1.0, Color32::from_rgb(51, 65, 85)),
            egui::StrokeKind::Inside,
        );

        for (row, kind) in LEGEND_KINDS.iter().enumerate() {
            let center = origin + vec2(16.0, 15.0 + row as f32 * row_height);
            painter.circle_filled(center, 5.0, node_style(kind).fill);
            painter.text(
                center + vec2(12.0, 0.0),
                Align2::LEFT_CENTER,
                kind.label(),
                FontId::proportional(12.0),
                Color32::from_gray(220),
            );
        }
    }
}
