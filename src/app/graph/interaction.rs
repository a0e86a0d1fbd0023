use eframe::egui::{self, Pos2, Rect, Ui};
use serde::Deserialize;

use crate::memory::GraphSnapshot;

use super::super::ViewModel;
use super::super::physics::{PositionSnapshot, Simulation};
use super::super::render_utils::{ViewTransform, node_style};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ViewConfig {
    pub(crate) min_scale: f32,
    pub(crate) max_scale: f32,
    /// Zoom change per unit of raw wheel delta.
    pub(crate) wheel_zoom_speed: f32,
    /// Alpha held while a node is being dragged.
    pub(crate) drag_alpha: f32,
    /// Extra screen-space pixels around a node that still count as a hit.
    pub(crate) hit_slop: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 4.0,
            wheel_zoom_speed: 0.0018,
            drag_alpha: 0.3,
            hit_slop: 3.0,
        }
    }
}

impl ViewConfig {
    /// Forces a positive zoom range with `max_scale >= min_scale`. NaN falls back to the floor.
    pub(crate) fn sanitized(self) -> Self {
        let min_scale = self.min_scale.max(0.01).min(100.0);
        Self {
            min_scale,
            max_scale: self.max_scale.max(min_scale).min(100.0),
            wheel_zoom_speed: self.wheel_zoom_speed.max(0.0).min(0.05),
            drag_alpha: self.drag_alpha.max(0.0).min(1.0),
            hit_slop: self.hit_slop.max(0.0).min(50.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    Idle,
    NodeDrag { node_id: String },
    Pan { last: Pos2 },
}

/// Pointer gestures → pin commands and view transform updates. Holds no physics state.
pub(in crate::app) struct Interaction {
    transform: ViewTransform,
    gesture: Gesture,
    config: ViewConfig,
}

impl Interaction {
    pub(in crate::app) fn new(config: ViewConfig) -> Self {
        Self {
            transform: ViewTransform::default(),
            gesture: Gesture::Idle,
            config: config.sanitized(),
        }
    }

    pub(in crate::app) fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub(in crate::app) fn config(&self) -> ViewConfig {
        self.config
    }

    pub(in crate::app) fn set_config(&mut self, config: ViewConfig) {
        self.config = config.sanitized();
        self.transform.scale = self
            .transform
            .scale
            .clamp(self.config.min_scale, self.config.max_scale);
    }

    pub(in crate::app) fn dragged_node(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::NodeDrag { node_id } => Some(node_id.as_str()),
            _ => None,
        }
    }

    pub(in crate::app) fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Pan { .. })
    }

    /// Starts a gesture. `hit` is the node under the pointer-down position, if any.
    pub(in crate::app) fn pointer_down(&mut self, simulation: &mut Simulation, pointer: Pos2, hit: Option<String>) {
        self.pointer_up(simulation);

        self.gesture = match hit {
            Some(node_id) => {
                simulation.reheat(self.config.drag_alpha);
                simulation.set_alpha_target(self.config.drag_alpha);
                simulation.pin(&node_id, self.transform.to_world(pointer));
                Gesture::NodeDrag { node_id }
            }
            None => Gesture::Pan { last: pointer },
        };
    }

    pub(in crate::app) fn pointer_move(&mut self, simulation: &mut Simulation, pointer: Pos2) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::NodeDrag { node_id } => {
                simulation.pin(node_id, self.transform.to_world(pointer));
            }
            Gesture::Pan { last } => {
                self.transform = self.transform.panned(pointer - *last);
                *last = pointer;
            }
        }
    }

    pub(in crate::app) fn pointer_up(&mut self, simulation: &mut Simulation) {
        if let Gesture::NodeDrag { node_id } = std::mem::replace(&mut self.gesture, Gesture::Idle) {
            simulation.unpin(&node_id);
            simulation.release_alpha_target();
        }
    }

    /// Multiplies the zoom by `factor`, keeping the point under `pointer` in place.
    pub(in crate::app) fn zoom(&mut self, pointer: Pos2, factor: f32) {
        self.transform =
            self.transform
                .zoomed_at(pointer, factor, self.config.min_scale, self.config.max_scale);
    }

    pub(in crate::app) fn fit(&mut self, world_center: egui::Vec2, canvas_size: egui::Vec2) {
        self.transform = ViewTransform::centered_on(world_center, canvas_size, 1.0);
    }

    /// Releases whatever the current gesture holds.
    pub(in crate::app) fn cancel(&mut self, simulation: &mut Simulation) {
        self.pointer_up(simulation);
    }
}

/// Topmost node whose disc (plus slop) contains the canvas-local `pointer`.
pub(in crate::app) fn hit_test(
    graph: &GraphSnapshot,
    positions: &PositionSnapshot,
    transform: ViewTransform,
    pointer: Pos2,
    slop: f32,
) -> Option<String> {
    let world = transform.to_world(pointer);
    graph
        .nodes
        .iter()
        .rev()
        .find(|node| {
            positions.get(&node.id).is_some_and(|position| {
                let reach = node_style(&node.kind).radius + slop / transform.scale;
                (position - world).length_sq() <= reach * reach
            })
        })
        .map(|node| node.id.clone())
}

/// Ctrl+wheel can arrive as both scroll and zoom delta in one frame; the zoom delta wins.
fn zoom_factor(scroll: f32, pinch: f32, wheel_zoom_speed: f32) -> f32 {
    if (pinch - 1.0).abs() > f32::EPSILON {
        pinch
    } else if scroll.abs() > f32::EPSILON {
        (1.0 + scroll * wheel_zoom_speed).clamp(0.85, 1.15)
    } else {
        1.0
    }
}

fn canvas_local(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

impl ViewModel {
    pub(in crate::app) fn node_under(&self, rect: Rect, screen: Pos2) -> Option<String> {
        hit_test(
            &self.active,
            &self.frame.borrow(),
            self.interaction.transform(),
            canvas_local(rect, screen),
            self.interaction.config().hit_slop,
        )
    }

    pub(in crate::app) fn handle_graph_input(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if response.drag_started() {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(origin) = origin {
                let hit = if response.drag_started_by(egui::PointerButton::Primary) {
                    self.node_under(rect, origin)
                } else {
                    None
                };
                self.interaction
                    .pointer_down(&mut self.simulation, canvas_local(rect, origin), hit);
            }
        }

        if response.dragged()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.interaction
                .pointer_move(&mut self.simulation, canvas_local(rect, pointer));
        }

        if response.drag_stopped() {
            self.interaction.pointer_up(&mut self.simulation);
        }

        if response.clicked() {
            let hit = response
                .interact_pointer_pos()
                .and_then(|pointer| self.node_under(rect, pointer));
            self.set_selected(hit);
        }

        if !response.hovered() {
            return;
        }

        let (scroll, pinch, hover) = ui.input(|input| {
            (
                input.raw_scroll_delta.y,
                input.zoom_delta(),
                input.pointer.hover_pos(),
            )
        });
        let factor = zoom_factor(scroll, pinch, self.interaction.config().wheel_zoom_speed);
        if (factor - 1.0).abs() > f32::EPSILON {
            let anchor = hover.unwrap_or_else(|| rect.center());
            self.interaction.zoom(canvas_local(rect, anchor), factor);
        }
    }
}
