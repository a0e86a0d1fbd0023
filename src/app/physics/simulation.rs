use std::collections::HashMap;
use std::rc::Rc;

use eframe::egui::{Vec2, vec2};

use crate::memory::{GraphError, GraphSnapshot};
use crate::util::stable_pair;

use super::SimulationConfig;
use super::forces::{Link, accumulate_forces};
use super::integrator::{Body, decay_alpha, integrate};

const INITIAL_RADIUS: f32 = 10.0;
const BIRTH_SEPARATION: f32 = 1e-3;

/// Read-only view of node positions published after every change.
#[derive(Clone, Debug)]
pub(crate) struct PositionSnapshot {
    step: u64,
    alpha: f32,
    ids: Rc<[String]>,
    index_by_id: Rc<HashMap<String, usize>>,
    positions: Vec<Vec2>,
}

impl PositionSnapshot {
    pub(crate) fn get(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.positions.get(index).copied())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, Vec2)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter().copied())
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn step(&self) -> u64 {
        self.step
    }

    pub(crate) fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ListenerId(u64);

type Listener = Box<dyn FnMut(&PositionSnapshot)>;

/// Sole owner of the live layout. Every mutation goes through one of its methods.
pub(crate) struct Simulation {
    config: SimulationConfig,
    center: Vec2,
    bodies: Vec<Body>,
    links: Vec<Link>,
    ids: Rc<[String]>,
    index_by_id: Rc<HashMap<String, usize>>,
    positions_scratch: Vec<Vec2>,
    forces_scratch: Vec<Vec2>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    step_count: u64,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
}

impl Simulation {
    pub(crate) fn new(config: SimulationConfig, center: Vec2) -> Self {
        Self {
            config: config.sanitized(),
            center,
            bodies: Vec::new(),
            links: Vec::new(),
            ids: Rc::from(Vec::new()),
            index_by_id: Rc::new(HashMap::new()),
            positions_scratch: Vec::new(),
            forces_scratch: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            running: false,
            step_count: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    pub(crate) fn config(&self) -> SimulationConfig {
        self.config
    }

    pub(crate) fn set_config(&mut self, config: SimulationConfig) {
        self.config = config.sanitized();
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.center
    }

    pub(crate) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn step_count(&self) -> u64 {
        self.step_count
    }

    pub(crate) fn node_count(&self) -> usize {
        self.bodies.len()
    }

    pub(crate) fn position(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.bodies[index].position)
    }

    pub(crate) fn is_pinned(&self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .is_some_and(|&index| self.bodies[index].pin.is_some())
    }

    pub(crate) fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            step: self.step_count,
            alpha: self.alpha,
            ids: Rc::clone(&self.ids),
            index_by_id: Rc::clone(&self.index_by_id),
            positions: self.bodies.iter().map(|body| body.position).collect(),
        }
    }

    /// Replaces the working set, keeping the state of every id that persists.
    ///
    /// A rejected snapshot leaves the current layout untouched.
    pub(crate) fn set_graph(&mut self, graph: &GraphSnapshot) -> Result<(), GraphError> {
        let resolved = match graph.resolve() {
            Ok(resolved) => resolved,
            Err(error) => {
                log::warn!("rejected graph snapshot: {error}");
                return Err(error);
            }
        };

        let mut bodies = Vec::with_capacity(graph.nodes.len());
        let mut newcomers = Vec::new();
        for (index, node) in graph.nodes.iter().enumerate() {
            match self.index_by_id.get(&node.id) {
                Some(&previous) => bodies.push(self.bodies[previous].clone()),
                None => {
                    newcomers.push(index);
                    bodies.push(Body {
                        position: self.center,
                        velocity: Vec2::ZERO,
                        pin: None,
                    });
                }
            }
        }

        let mut occupied = bodies
            .iter()
            .enumerate()
            .filter(|(index, _)| !newcomers.contains(index))
            .map(|(_, body)| body.position)
            .collect::<Vec<_>>();
        for &index in &newcomers {
            let position = birth_position(self.center, index, &graph.nodes[index].id, &occupied);
            bodies[index].position = position;
            occupied.push(position);
        }

        let mut degrees = vec![0usize; bodies.len()];
        for edge in &resolved.edges {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }
        self.links = resolved
            .edges
            .iter()
            .map(|edge| Link::new(edge.source, edge.target, edge.weight, &degrees))
            .collect();

        let kept = bodies.len() - newcomers.len();
        self.bodies = bodies;
        self.ids = graph.nodes.iter().map(|node| node.id.clone()).collect();
        self.index_by_id = Rc::new(resolved.index_by_id);

        log::info!(
            "applied graph snapshot: {} nodes ({} kept, {} new), {} edges",
            self.bodies.len(),
            kept,
            newcomers.len(),
            self.links.len()
        );

        self.reheat(self.config.reheat_alpha);
        self.notify();
        Ok(())
    }

    pub(crate) fn start(&mut self) {
        self.running = !self.bodies.is_empty();
    }

    /// Raises alpha to at least `amount` and resumes stepping.
    pub(crate) fn reheat(&mut self, amount: f32) {
        let amount = amount.clamp(0.0, 1.0);
        if amount > self.alpha {
            self.alpha = amount;
        }
        log::debug!("reheat to {amount:.3}, alpha now {:.3}", self.alpha);
        self.start();
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    /// Keeps alpha from cooling below `target` until released.
    pub(crate) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub(crate) fn release_alpha_target(&mut self) {
        self.alpha_target = 0.0;
    }

    pub(crate) fn pin(&mut self, id: &str, position: Vec2) {
        let Some(&index) = self.index_by_id.get(id) else {
            log::debug!("ignoring pin for unknown node {id}");
            return;
        };

        let body = &mut self.bodies[index];
        body.pin = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        self.notify();
    }

    pub(crate) fn unpin(&mut self, id: &str) {
        let Some(&index) = self.index_by_id.get(id) else {
            log::debug!("ignoring unpin for unknown node {id}");
            return;
        };
        self.bodies[index].pin = None;
    }

    pub(crate) fn subscribe(&mut self, listener: impl FnMut(&PositionSnapshot) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// One cooperative unit of work for the host frame loop. Returns whether any step ran.
    pub(crate) fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        for _ in 0..self.config.steps_per_tick {
            self.step();
            self.notify();

            if self.alpha <= self.config.alpha_min && self.alpha_target <= self.config.alpha_min {
                self.running = false;
                log::debug!("layout settled after {} steps", self.step_count);
                break;
            }
        }
        true
    }

    /// Steps until settled or `max_steps` ran out; returns the number of steps taken.
    pub(crate) fn settle(&mut self, max_steps: usize) -> usize {
        self.start();
        let first = self.step_count;
        while self.running && self.step_count - first < max_steps as u64 {
            self.tick();
        }
        (self.step_count - first) as usize
    }

    /// Halts stepping and drops every listener.
    pub(crate) fn teardown(&mut self) {
        self.running = false;
        self.alpha_target = 0.0;
        self.listeners.clear();
        log::debug!("simulation torn down after {} steps", self.step_count);
    }

    fn step(&mut self) {
        let count = self.bodies.len();
        self.positions_scratch.clear();
        self.positions_scratch
            .extend(self.bodies.iter().map(|body| body.position));
        self.forces_scratch.clear();
        self.forces_scratch.resize(count, Vec2::ZERO);

        accumulate_forces(
            &self.positions_scratch,
            &self.links,
            self.center,
            &self.config,
            &mut self.forces_scratch,
        );
        integrate(&mut self.bodies, &self.forces_scratch, self.alpha, &self.config);

        self.alpha = decay_alpha(self.alpha, self.alpha_target, &self.config);
        self.step_count += 1;
        log::trace!("step {} alpha {:.4}", self.step_count, self.alpha);
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }
}

/// Sunflower spiral slot around the center plus a per-id jitter, nudged off any occupied point.
fn birth_position(center: Vec2, slot: usize, id: &str, occupied: &[Vec2]) -> Vec2 {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let (jx, jy) = stable_pair(id);

    let mut slot = slot;
    loop {
        let radius = INITIAL_RADIUS * (0.5 + slot as f32).sqrt();
        let angle = slot as f32 * golden_angle;
        let candidate = center + vec2(angle.cos(), angle.sin()) * radius + vec2(jx, jy);
        let taken = occupied
            .iter()
            .any(|position| (*position - candidate).length_sq() < BIRTH_SEPARATION * BIRTH_SEPARATION);
        if !taken {
            return candidate;
        }
        slot += occupied.len().max(1);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use crate::memory::{GraphEdge, GraphNode, NodeKind, sample_graph};

    use super::*;

    const CANVAS: Vec2 = vec2(800.0, 600.0);

    fn center() -> Vec2 {
        CANVAS * 0.5
    }

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_owned(),
            label: id.to_owned(),
            kind: NodeKind::Entity,
            properties: BTreeMap::new(),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            id: id.to_owned(),
            source: source.to_owned(),
            target: target.to_owned(),
            label: String::new(),
            weight: 1.0,
        }
    }

    fn sample_simulation() -> Simulation {
        let mut simulation = Simulation::new(SimulationConfig::default(), center());
        simulation.set_graph(&sample_graph()).unwrap();
        simulation
    }

    fn ring(count: usize) -> GraphSnapshot {
        let nodes = (0..count).map(|index| node(&format!("n{index}"))).collect();
        let edges = (0..count)
            .map(|index| {
                edge(
                    &format!("e{index}"),
                    &format!("n{index}"),
                    &format!("n{}", (index + 1) % count),
                )
            })
            .chain((0..count).step_by(7).map(|index| {
                edge(
                    &format!("chord{index}"),
                    &format!("n{index}"),
                    &format!("n{}", (index * 3 + 11) % count),
                )
            }))
            .collect();
        GraphSnapshot { nodes, edges }
    }

    fn record(simulation: &mut Simulation) -> Rc<RefCell<Vec<PositionSnapshot>>> {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        simulation.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
        frames
    }

    #[test]
    fn identical_runs_produce_identical_positions() {
        let mut first = sample_simulation();
        let mut second = sample_simulation();

        for _ in 0..120 {
            first.tick();
            second.tick();
            let a = first.snapshot();
            let b = second.snapshot();
            assert_eq!(a.positions, b.positions);
        }
    }

    #[test]
    fn sample_settles_near_the_center() {
        let mut simulation = sample_simulation();
        let alphas = record(&mut simulation);

        for _ in 0..300 {
            simulation.tick();
        }

        assert!(simulation.alpha() <= simulation.config().alpha_min);
        assert!(!simulation.is_running());

        let bound = CANVAS.length() * 3.0;
        for (id, position) in simulation.snapshot().iter() {
            assert!(position.is_finite(), "{id} is not finite");
            assert!((position - center()).length() <= bound, "{id} drifted to {position:?}");
        }

        let alphas = alphas
            .borrow()
            .iter()
            .map(PositionSnapshot::alpha)
            .collect::<Vec<_>>();
        assert!(alphas.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn connected_graph_converges_without_nan() {
        for (count, theta) in [(60, None), (500, None), (500, Some(0.9))] {
            let config = SimulationConfig {
                barnes_hut_theta: theta,
                ..SimulationConfig::default()
            };
            let mut simulation = Simulation::new(config, center());
            simulation.set_graph(&ring(count)).unwrap();
            simulation.reheat(1.0);

            let mut previous = simulation.alpha();
            let mut steps = 0;
            while simulation.tick() {
                steps += 1;
                assert!(simulation.alpha() <= previous);
                previous = simulation.alpha();
                assert!(steps <= 300, "still running after {steps} steps");
            }

            assert!(simulation.alpha() <= simulation.config().alpha_min);
            assert!(simulation.snapshot().iter().all(|(_, position)| position.is_finite()));
        }
    }

    #[test]
    fn pinned_node_reports_exact_coordinate_every_step() {
        let mut simulation = sample_simulation();
        let frames = record(&mut simulation);

        simulation.pin("3", vec2(50.0, 50.0));
        for _ in 0..40 {
            simulation.tick();
        }

        let frames = frames.borrow();
        assert!(frames.len() > 40);
        for frame in frames.iter() {
            assert_eq!(frame.get("3"), Some(vec2(50.0, 50.0)));
        }
    }

    #[test]
    fn released_node_moves_again() {
        let mut simulation = sample_simulation();
        simulation.reheat(0.3);
        simulation.set_alpha_target(0.3);
        simulation.pin("3", vec2(50.0, 50.0));
        for _ in 0..20 {
            simulation.tick();
            assert_eq!(simulation.position("3"), Some(vec2(50.0, 50.0)));
        }

        simulation.unpin("3");
        simulation.release_alpha_target();
        assert!(!simulation.is_pinned("3"));
        simulation.tick();
        simulation.tick();
        assert_ne!(simulation.position("3"), Some(vec2(50.0, 50.0)));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut simulation = sample_simulation();
        let before = simulation.snapshot().positions;
        simulation.pin("ghost", vec2(1.0, 1.0));
        simulation.unpin("ghost");
        assert_eq!(simulation.snapshot().positions, before);
    }

    #[test]
    fn reconciliation_keeps_shared_positions_and_places_newcomers_apart() {
        let mut simulation = sample_simulation();
        for _ in 0..50 {
            simulation.tick();
        }
        let before = simulation.snapshot();

        let mut next = sample_graph();
        next.nodes.retain(|node| node.id != "4");
        next.edges.retain(|edge| edge.source != "4" && edge.target != "4");
        next.nodes.push(node("6"));
        next.nodes.push(node("7"));
        next.edges.push(edge("e6", "6", "1"));
        simulation.set_graph(&next).unwrap();

        let after = simulation.snapshot();
        for id in ["1", "2", "3", "5"] {
            assert_eq!(after.get(id), before.get(id));
        }
        assert_eq!(after.get("4"), None);

        for newcomer in ["6", "7"] {
            let position = after.get(newcomer).unwrap();
            for (id, other) in after.iter() {
                if id != newcomer {
                    assert!((other - position).length() > BIRTH_SEPARATION, "{newcomer} overlaps {id}");
                }
            }
        }
        assert!(simulation.is_running());
    }

    #[test]
    fn rejected_snapshot_leaves_layout_untouched() {
        let mut simulation = sample_simulation();
        for _ in 0..10 {
            simulation.tick();
        }
        let before = simulation.snapshot();

        let mut broken = sample_graph();
        broken.edges.push(edge("bad", "1", "404"));
        let error = simulation.set_graph(&broken).unwrap_err();

        assert!(matches!(error, GraphError::DanglingEdge { ref edge_id, .. } if edge_id == "bad"));
        let after = simulation.snapshot();
        assert_eq!(after.positions, before.positions);
        assert_eq!(after.len(), 5);
    }

    #[test]
    fn stop_and_reheat_control_stepping() {
        let mut simulation = sample_simulation();
        simulation.stop();
        assert!(!simulation.tick());

        let settled = simulation.settle(1_000);
        assert!(settled > 0);
        assert!(!simulation.tick());

        simulation.reheat(0.3);
        assert!((simulation.alpha() - 0.3).abs() < f32::EPSILON);
        assert!(simulation.tick());
    }

    #[test]
    fn teardown_detaches_listeners() {
        let mut simulation = sample_simulation();
        let frames = record(&mut simulation);
        simulation.tick();
        let seen = frames.borrow().len();

        simulation.teardown();
        simulation.reheat(0.5);
        simulation.tick();
        assert_eq!(frames.borrow().len(), seen);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let mut simulation = sample_simulation();
        let kept = record(&mut simulation);
        let dropped = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&dropped);
        let id = simulation.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(simulation.unsubscribe(id));
        assert!(!simulation.unsubscribe(id));
        simulation.tick();
        assert_eq!(*dropped.borrow(), 0);
        assert_eq!(kept.borrow().len(), 1);
    }

    #[test]
    fn empty_graph_never_runs() {
        let mut simulation = Simulation::new(SimulationConfig::default(), center());
        simulation.set_graph(&GraphSnapshot::default()).unwrap();
        assert!(!simulation.is_running());
        assert!(!simulation.tick());
        assert!(simulation.snapshot().is_empty());
    }
}
