use eframe::egui::{Vec2, vec2};

use super::SimulationConfig;
use super::quadtree::QuadNode;

/// Edge prepared for the spring force: endpoints plus the coefficients derived from node degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) weight: f32,
    pub(super) stiffness: f32,
    pub(super) bias: f32,
}

impl Link {
    pub(super) fn new(source: usize, target: usize, weight: f32, degrees: &[usize]) -> Self {
        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        Self {
            source,
            target,
            weight,
            stiffness: 1.0 / source_degree.min(target_degree),
            bias: source_degree / (source_degree + target_degree),
        }
    }
}

const COINCIDENT_DISTANCE_SQ: f32 = 1e-12;

fn coincident_direction(low: usize, high: usize) -> Vec2 {
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Force on the node at `index` caused by the node at `other_index`.
fn repulsion_between(
    positions: &[Vec2],
    index: usize,
    other_index: usize,
    strength: f32,
    min_distance: f32,
) -> Vec2 {
    let mut delta = positions[other_index] - positions[index];
    let mut distance_sq = delta.length_sq();
    if distance_sq < COINCIDENT_DISTANCE_SQ {
        let direction = coincident_direction(index.min(other_index), index.max(other_index));
        delta = if index < other_index {
            direction * min_distance
        } else {
            -direction * min_distance
        };
        distance_sq = min_distance * min_distance;
    }

    delta * (strength / distance_sq.max(min_distance * min_distance))
}

pub(super) fn accumulate_repulsion_exact(
    positions: &[Vec2],
    strength: f32,
    min_distance: f32,
    forces: &mut [Vec2],
) {
    for index in 0..positions.len() {
        for other_index in (index + 1)..positions.len() {
            let force = repulsion_between(positions, index, other_index, strength, min_distance);
            forces[index] += force;
            forces[other_index] -= force;
        }
    }
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    min_distance: f32,
    theta: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(positions, index, other_index, strength, min_distance);
        }
        return;
    }

    let delta = node.center_of_mass - point;
    let distance_sq = delta.length_sq().max(min_distance * min_distance);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < theta)
        && node.mass > 1.0;

    if can_approximate {
        *force += delta * (strength * node.mass / distance_sq);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(
            child,
            index,
            positions,
            strength,
            min_distance,
            theta,
            force,
        );
    }
}

pub(super) fn accumulate_link_forces(
    positions: &[Vec2],
    links: &[Link],
    config: &SimulationConfig,
    forces: &mut [Vec2],
) {
    for link in links {
        if link.source == link.target {
            continue;
        }

        let delta = positions[link.target] - positions[link.source];
        let distance = delta.length();
        if distance * distance < COINCIDENT_DISTANCE_SQ {
            continue;
        }

        let weight_factor = if config.weight_scaled_links {
            link.weight
        } else {
            1.0
        };
        let coefficient = (link.stiffness * config.link_strength * weight_factor).min(1.0);
        let pull = delta * ((distance - config.link_distance) / distance * coefficient);

        forces[link.target] -= pull * link.bias;
        forces[link.source] += pull * (1.0 - link.bias);
    }
}

pub(super) fn accumulate_centering(
    positions: &[Vec2],
    center: Vec2,
    strength: f32,
    forces: &mut [Vec2],
) {
    if positions.is_empty() || strength == 0.0 {
        return;
    }

    let centroid = positions.iter().fold(Vec2::ZERO, |sum, position| sum + *position)
        / positions.len() as f32;
    let shift = (center - centroid) * strength;
    for force in forces.iter_mut() {
        *force += shift;
    }
}

/// Net force per node for one step. `forces` must be zeroed and as long as `positions`.
pub(super) fn accumulate_forces(
    positions: &[Vec2],
    links: &[Link],
    center: Vec2,
    config: &SimulationConfig,
    forces: &mut [Vec2],
) {
    match config.barnes_hut_theta {
        Some(theta) if positions.len() > 1 => {
            if let Some(quadtree) = QuadNode::build(positions) {
                for (index, force) in forces.iter_mut().enumerate() {
                    accumulate_repulsion_for_node(
                        &quadtree,
                        index,
                        positions,
                        config.charge_strength,
                        config.min_distance,
                        theta,
                        force,
                    );
                }
            }
        }
        _ => accumulate_repulsion_exact(
            positions,
            config.charge_strength,
            config.min_distance,
            forces,
        ),
    }

    accumulate_link_forces(positions, links, config, forces);
    accumulate_centering(positions, center, config.centering_strength, forces);
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn zeroed(count: usize) -> Vec<Vec2> {
        vec![Vec2::ZERO; count]
    }

    #[test]
    fn repulsion_pushes_nodes_apart_symmetrically() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let mut forces = zeroed(2);
        accumulate_repulsion_exact(&positions, -300.0, 1.0, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert_abs_diff_eq!(forces[0].x, -30.0, epsilon = 1e-4);
        assert_abs_diff_eq!((forces[0] + forces[1]).length(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn coincident_nodes_get_finite_opposite_forces() {
        let positions = [vec2(5.0, 5.0), vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let mut forces = zeroed(3);
        accumulate_repulsion_exact(&positions, -300.0, 1.0, &mut forces);

        for force in &forces {
            assert!(force.x.is_finite() && force.y.is_finite());
            assert!(force.length() > 0.0);
        }
        let net = forces.iter().fold(Vec2::ZERO, |sum, force| sum + *force);
        assert_abs_diff_eq!(net.length(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn barnes_hut_tracks_exact_repulsion() {
        let positions = (0..200)
            .map(|index| {
                let angle = index as f32 * 0.37;
                vec2(angle.cos(), angle.sin()) * (20.0 + index as f32 * 3.0)
            })
            .collect::<Vec<_>>();
        let config = SimulationConfig::default();

        let mut exact = zeroed(positions.len());
        accumulate_repulsion_exact(&positions, config.charge_strength, 1.0, &mut exact);

        let quadtree = QuadNode::build(&positions).unwrap();
        let mut total_error = 0.0;
        let mut total_magnitude = 0.0;
        for (index, expected) in exact.iter().enumerate() {
            let mut approximate = Vec2::ZERO;
            accumulate_repulsion_for_node(
                &quadtree,
                index,
                &positions,
                config.charge_strength,
                1.0,
                0.5,
                &mut approximate,
            );
            assert!(approximate.x.is_finite() && approximate.y.is_finite());
            total_error += (approximate - *expected).length();
            total_magnitude += expected.length();
        }
        assert!(
            total_error <= total_magnitude * 0.1,
            "error {total_error} vs magnitude {total_magnitude}"
        );
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = [vec2(0.0, 0.0), vec2(300.0, 0.0)];
        let degrees = [1, 1];
        let links = [Link::new(0, 1, 1.0, &degrees)];
        let config = SimulationConfig::default();
        let mut forces = zeroed(2);
        accumulate_link_forces(&positions, &links, &config, &mut forces);

        assert_abs_diff_eq!(forces[0].x, 100.0, epsilon = 1e-4);
        assert_abs_diff_eq!(forces[1].x, -100.0, epsilon = 1e-4);
    }

    #[test]
    fn compressed_link_pushes_and_weight_scales() {
        let positions = [vec2(0.0, 0.0), vec2(50.0, 0.0)];
        let degrees = [1, 1];
        let config = SimulationConfig::default();

        let mut light = zeroed(2);
        accumulate_link_forces(
            &positions,
            &[Link::new(0, 1, 0.25, &degrees)],
            &config,
            &mut light,
        );
        let mut heavy = zeroed(2);
        accumulate_link_forces(
            &positions,
            &[Link::new(0, 1, 1.0, &degrees)],
            &config,
            &mut heavy,
        );

        assert!(heavy[1].x > 0.0);
        assert!(heavy[1].x > light[1].x);

        let unweighted = SimulationConfig {
            weight_scaled_links: false,
            ..config
        };
        let mut flat = zeroed(2);
        accumulate_link_forces(
            &positions,
            &[Link::new(0, 1, 0.25, &degrees)],
            &unweighted,
            &mut flat,
        );
        assert_abs_diff_eq!(flat[1].x, heavy[1].x, epsilon = 1e-5);
    }

    #[test]
    fn hub_endpoint_moves_less() {
        let degrees = [3, 1];
        let link = Link::new(0, 1, 1.0, &degrees);
        assert_abs_diff_eq!(link.stiffness, 1.0);
        assert_abs_diff_eq!(link.bias, 0.75);

        let positions = [vec2(0.0, 0.0), vec2(200.0, 0.0)];
        let mut forces = zeroed(2);
        accumulate_link_forces(&positions, &[link], &SimulationConfig::default(), &mut forces);
        assert!(forces[1].x.abs() > forces[0].x.abs());
    }

    #[test]
    fn centering_translates_without_changing_spread() {
        let positions = [vec2(100.0, 0.0), vec2(300.0, 0.0)];
        let mut forces = zeroed(2);
        accumulate_centering(&positions, vec2(0.0, 0.0), 0.1, &mut forces);

        assert_eq!(forces[0], forces[1]);
        assert_abs_diff_eq!(forces[0].x, -20.0, epsilon = 1e-5);
    }
}
