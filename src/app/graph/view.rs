use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::memory::GraphSnapshot;
use crate::util::truncate_label;

use super::super::physics::PositionSnapshot;
use super::super::render_utils::{
    EDGE_COLOR, HIGHLIGHT_COLOR, LABEL_COLOR, MATCH_COLOR, NODE_OUTLINE, ViewTransform, blend_color,
    circle_visible, draw_background, edge_width, node_style,
};
use super::super::{SearchMatchCache, ViewModel};

const LABEL_OFFSET: egui::Vec2 = vec2(15.0, 5.0);
const LABEL_FONT_SIZE: f32 = 10.0;
const LABEL_MIN_SCALE: f32 = 0.45;
const LABEL_MAX_CHARS: usize = 36;

/// Which nodes get emphasis in a frame. Indices refer to the snapshot's node order.
#[derive(Clone, Copy, Default)]
pub(in crate::app) struct Emphasis<'a> {
    pub(in crate::app) selected: Option<&'a str>,
    pub(in crate::app) hovered: Option<&'a str>,
    pub(in crate::app) matches: Option<&'a HashSet<usize>>,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct EdgeShape {
    pub(in crate::app) from: Pos2,
    pub(in crate::app) to: Pos2,
    pub(in crate::app) width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct NodeShape {
    pub(in crate::app) center: Pos2,
    pub(in crate::app) radius: f32,
    pub(in crate::app) fill: Color32,
    pub(in crate::app) ring: Option<Color32>,
    pub(in crate::app) label: Option<String>,
}

/// Screen-space geometry for one frame, in canvas-local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct Frame {
    pub(in crate::app) edges: Vec<EdgeShape>,
    pub(in crate::app) nodes: Vec<NodeShape>,
}

/// Pure function of graph, positions and view; nothing here touches the simulation.
pub(in crate::app) fn build_frame(
    graph: &GraphSnapshot,
    positions: &PositionSnapshot,
    transform: ViewTransform,
    emphasis: Emphasis<'_>,
) -> Frame {
    let mut frame = Frame::default();
    let scale = transform.scale;

    for edge in &graph.edges {
        let (Some(source), Some(target)) = (positions.get(&edge.source), positions.get(&edge.target))
        else {
            continue;
        };
        frame.edges.push(EdgeShape {
            from: transform.to_screen(source),
            to: transform.to_screen(target),
            width: edge_width(edge.weight) * scale,
        });
    }

    let searching = emphasis.matches.is_some_and(|matches| !matches.is_empty());
    for (index, node) in graph.nodes.iter().enumerate() {
        let Some(position) = positions.get(&node.id) else {
            continue;
        };

        let style = node_style(&node.kind);
        let is_selected = emphasis.selected == Some(node.id.as_str());
        let is_hovered = emphasis.hovered == Some(node.id.as_str());
        let is_match = emphasis
            .matches
            .is_some_and(|matches| matches.contains(&index));

        let fill = if searching && !is_match && !is_selected {
            blend_color(style.fill, Color32::from_rgb(15, 23, 42), 0.6)
        } else {
            style.fill
        };
        let ring = if is_selected {
            Some(HIGHLIGHT_COLOR)
        } else if is_match {
            Some(MATCH_COLOR)
        } else {
            None
        };
        let show_label = scale >= LABEL_MIN_SCALE || is_selected || is_hovered || is_match;

        frame.nodes.push(NodeShape {
            center: transform.to_screen(position),
            radius: style.radius * scale,
            fill,
            ring,
            label: show_label.then(|| truncate_label(&node.label, LABEL_MAX_CHARS)),
        });
    }

    frame
}

pub(in crate::app) fn paint_frame(painter: &egui::Painter, rect: Rect, frame: &Frame, scale: f32) {
    let offset = rect.min.to_vec2();

    for edge in &frame.edges {
        painter.line_segment(
            [edge.from + offset, edge.to + offset],
            Stroke::new(edge.width.max(0.5), EDGE_COLOR),
        );
    }

    let font = FontId::proportional((LABEL_FONT_SIZE * scale).clamp(8.0, 22.0));
    for node in &frame.nodes {
        let center = node.center + offset;
        if !circle_visible(rect, center, node.radius + 4.0) {
            continue;
        }

        painter.circle_filled(center, node.radius, node.fill);
        painter.circle_stroke(center, node.radius, Stroke::new(2.0 * scale, NODE_OUTLINE));
        if let Some(ring) = node.ring {
            painter.circle_stroke(center, node.radius + 3.0, Stroke::new(2.0, ring));
        }
        if let Some(label) = &node.label {
            painter.text(
                center + LABEL_OFFSET * scale,
                Align2::LEFT_CENTER,
                label,
                font.clone(),
                LABEL_COLOR,
            );
        }
    }
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let matches = self
            .active
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                matcher.fuzzy_match(&node.label, query).is_some()
                    || matcher.fuzzy_match(&node.id, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn layout_centroid(&self) -> Option<egui::Vec2> {
        let positions = self.frame.borrow();
        if positions.is_empty() {
            return None;
        }
        let sum = positions
            .iter()
            .fold(egui::Vec2::ZERO, |sum, (_, position)| sum + position);
        Some(sum / positions.len() as f32)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.fit_pending {
            let centroid = self.layout_centroid().unwrap_or_else(|| self.simulation.center());
            self.interaction.fit(centroid, rect.size());
            self.fit_pending = false;
        }

        self.handle_graph_input(ui, rect, &response);

        if self.live_physics && self.simulation.tick() {
            ui.ctx().request_repaint();
        }

        let transform = self.interaction.transform();
        draw_background(&painter, rect, transform);

        if self.frame.borrow().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No memory nodes to display.",
                FontId::proportional(14.0),
                Color32::from_gray(150),
            );
            return;
        }

        let hovered = response
            .hover_pos()
            .and_then(|pointer| self.node_under(rect, pointer));
        if self.interaction.dragged_node().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
        }

        let matches = self.cached_search_matches();
        let frame = {
            let positions = self.frame.borrow();
            build_frame(
                &self.active,
                &positions,
                transform,
                Emphasis {
                    selected: self.selected.as_deref(),
                    hovered: hovered.as_deref(),
                    matches: matches.as_deref(),
                },
            )
        };
        paint_frame(&painter, rect, &frame, transform.scale);

        if let Some(node) = hovered.as_deref().and_then(|id| self.active.node(id)) {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  {} edges",
                    node.label,
                    node.kind.label(),
                    self.active.incident_edges(&node.id).count()
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.draw_legend(&painter, rect);
    }
}
