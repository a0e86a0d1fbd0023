use eframe::egui::Vec2;

use super::SimulationConfig;

/// Mutable per-node physics state owned by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct Body {
    pub(super) position: Vec2,
    pub(super) velocity: Vec2,
    pub(super) pin: Option<Vec2>,
}

/// Advances every body by one step using the already accumulated `forces`.
pub(super) fn integrate(bodies: &mut [Body], forces: &[Vec2], alpha: f32, config: &SimulationConfig) {
    let max_speed_sq = config.max_speed * config.max_speed;

    for (body, force) in bodies.iter_mut().zip(forces) {
        if let Some(pin) = body.pin {
            body.position = pin;
            body.velocity = Vec2::ZERO;
            continue;
        }

        let mut velocity = (body.velocity + *force * alpha) * config.velocity_decay;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= config.max_speed / speed_sq.sqrt();
        }
        if !velocity.is_finite() {
            velocity = Vec2::ZERO;
        }

        body.velocity = velocity;
        body.position += velocity;
    }
}

/// Moves alpha one step toward `target`; with a zero target this is `alpha * alpha_decay`.
pub(super) fn decay_alpha(alpha: f32, target: f32, config: &SimulationConfig) -> f32 {
    let next = alpha + (target - alpha) * (1.0 - config.alpha_decay);
    next.max(config.alpha_min).min(1.0)
}
