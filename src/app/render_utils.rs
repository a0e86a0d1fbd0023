use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2};

use crate::memory::NodeKind;

/// Pan/zoom mapping from simulation space to canvas-local screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ViewTransform {
    pub(super) translate: Vec2,
    pub(super) scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub(super) fn to_screen(self, world: Vec2) -> Pos2 {
        (world * self.scale + self.translate).to_pos2()
    }

    pub(super) fn to_world(self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }

    /// Scales by `factor` (clamped to `[min_scale, max_scale]`) keeping `anchor` fixed on screen.
    pub(super) fn zoomed_at(self, anchor: Pos2, factor: f32, min_scale: f32, max_scale: f32) -> Self {
        let world = self.to_world(anchor);
        let scale = (self.scale * factor).clamp(min_scale, max_scale);
        Self {
            translate: anchor.to_vec2() - world * scale,
            scale,
        }
    }

    pub(super) fn panned(self, delta: Vec2) -> Self {
        Self {
            translate: self.translate + delta,
            scale: self.scale,
        }
    }

    /// Transform that shows `world_center` in the middle of a canvas of `canvas_size`.
    pub(super) fn centered_on(world_center: Vec2, canvas_size: Vec2, scale: f32) -> Self {
        Self {
            translate: canvas_size * 0.5 - world_center * scale,
            scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct NodeStyle {
    pub(super) radius: f32,
    pub(super) fill: Color32,
}

pub(super) const NODE_OUTLINE: Color32 = Color32::from_rgb(30, 41, 59);
pub(super) const LABEL_COLOR: Color32 = Color32::from_rgb(248, 250, 252);
pub(super) const EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(31, 39, 51, 153);
pub(super) const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) fn node_style(kind: &NodeKind) -> NodeStyle {
    match kind {
        NodeKind::Entity => NodeStyle {
            radius: 12.0,
            fill: Color32::from_rgb(96, 165, 250),
        },
        NodeKind::Experience => NodeStyle {
            radius: 8.0,
            fill: Color32::from_rgb(129, 140, 248),
        },
        NodeKind::Context => NodeStyle {
            radius: 8.0,
            fill: Color32::from_rgb(251, 191, 36),
        },
        NodeKind::Other(_) => NodeStyle {
            radius: 8.0,
            fill: Color32::from_rgb(148, 163, 184),
        },
    }
}

/// Stroke width in simulation units; grows with the square root of the weight.
pub(super) fn edge_width(weight: f32) -> f32 {
    weight.max(0.0).sqrt() * 2.0
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(2, 6, 23));

    let step = (50.0 * transform.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(51, 65, 85, 40));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}
