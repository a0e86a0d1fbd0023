mod forces;
mod integrator;
mod quadtree;
mod simulation;

use serde::Deserialize;

pub(crate) use simulation::{ListenerId, PositionSnapshot, Simulation};

/// Tunables for the force model and the integrator.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SimulationConfig {
    /// Many-body strength; negative values repel.
    pub(crate) charge_strength: f32,
    /// Distance floor used by the repulsion term.
    pub(crate) min_distance: f32,
    /// Barnes–Hut opening angle. `None` runs the exact pairwise repulsion.
    pub(crate) barnes_hut_theta: Option<f32>,
    pub(crate) link_distance: f32,
    pub(crate) link_strength: f32,
    pub(crate) weight_scaled_links: bool,
    pub(crate) centering_strength: f32,
    pub(crate) velocity_decay: f32,
    pub(crate) max_speed: f32,
    pub(crate) alpha_min: f32,
    pub(crate) alpha_decay: f32,
    /// Alpha applied when a new snapshot is reconciled into a running layout.
    pub(crate) reheat_alpha: f32,
    pub(crate) steps_per_tick: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge_strength: -300.0,
            min_distance: 1.0,
            barnes_hut_theta: None,
            link_distance: 100.0,
            link_strength: 1.0,
            weight_scaled_links: true,
            centering_strength: 0.1,
            velocity_decay: 0.6,
            max_speed: 50.0,
            alpha_min: 0.001,
            alpha_decay: 0.975,
            reheat_alpha: 0.3,
            steps_per_tick: 1,
        }
    }
}

impl SimulationConfig {
    /// Clamps every knob into a range the integrator stays stable in.
    pub(crate) fn sanitized(self) -> Self {
        Self {
            charge_strength: self.charge_strength.clamp(-5_000.0, 5_000.0),
            min_distance: self.min_distance.clamp(0.01, 100.0),
            barnes_hut_theta: self.barnes_hut_theta.map(|theta| theta.clamp(0.1, 2.0)),
            link_distance: self.link_distance.clamp(1.0, 2_000.0),
            link_strength: self.link_strength.clamp(0.0, 1.0),
            weight_scaled_links: self.weight_scaled_links,
            centering_strength: self.centering_strength.clamp(0.0, 1.0),
            velocity_decay: self.velocity_decay.clamp(0.0, 0.99),
            max_speed: self.max_speed.clamp(1.0, 1_000.0),
            alpha_min: self.alpha_min.clamp(0.000_01, 0.5),
            alpha_decay: self.alpha_decay.clamp(0.5, 0.9999),
            reheat_alpha: self.reheat_alpha.clamp(0.0, 1.0),
            steps_per_tick: self.steps_per_tick.clamp(1, 64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"link_distance": 60, "barnes_hut_theta": 0.8}"#).unwrap();
        assert_eq!(config.link_distance, 60.0);
        assert_eq!(config.barnes_hut_theta, Some(0.8));
        assert_eq!(config.charge_strength, -300.0);
        assert_eq!(config.alpha_min, 0.001);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = SimulationConfig {
            alpha_decay: 2.0,
            velocity_decay: -1.0,
            steps_per_tick: 0,
            ..SimulationConfig::default()
        }
        .sanitized();
        assert!(config.alpha_decay < 1.0);
        assert_eq!(config.velocity_decay, 0.0);
        assert_eq!(config.steps_per_tick, 1);
        assert_eq!(SimulationConfig::default().sanitized(), SimulationConfig::default());
    }
}
