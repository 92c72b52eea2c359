//! Layout driver: configures the force simulation and reacts to its ticks.
//!
//! The physics itself lives behind the [`Simulator`] trait; the default
//! backend is the `force_graph` crate. The driver owns what sits around it:
//! - an energy schedule (alpha) that decides when the layout has converged
//! - a tick handler writing simulated positions back into the model and
//!   recomputing all edge geometry in one O(E) pass
//! - the drag pin lifecycle
//! - teardown and reconstruction on relayout, keeping pinned vertices pinned

use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::geometry::{self, EdgeGeometry};
use super::model::GraphModel;
use super::options::GraphOptions;
use super::types::Point;
use super::viewport::ViewportController;

/// Energy below which the layout counts as converged.
const ALPHA_MIN: f64 = 0.001;
/// Energy the simulation is held at while a vertex is dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;
/// Radius of the ring unpositioned vertices start on.
const SEED_RADIUS: f64 = 100.0;

/// Forces and scheduling handed to a simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
	pub link_distance: f64,
	pub charge_strength: f64,
	pub center: Point,
	pub alpha_decay: f64,
}

impl SimulationConfig {
	pub fn from_options(options: &GraphOptions, center: Point) -> Self {
		Self {
			link_distance: options.distance,
			charge_strength: options.charge_strength,
			center,
			alpha_decay: options.alpha_decay,
		}
	}
}

/// Initial state of one simulated vertex, indexed by ordinal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimNode {
	pub position: Point,
	pub pinned: Option<Point>,
}

/// An external force simulator addressed by vertex ordinal.
pub trait Simulator {
	/// Advances the simulation by `dt` seconds.
	fn step(&mut self, dt: f64);
	fn position(&self, ordinal: usize) -> Option<Point>;
	/// Holds a vertex at `at` until released.
	fn pin(&mut self, ordinal: usize, at: Point);
	fn release(&mut self, ordinal: usize);
}

/// Builds a simulator for the given vertices and `(source, target)` ordinal links.
pub type SimulatorFactory = Box<dyn Fn(&SimulationConfig, &[SimNode], &[(usize, usize)]) -> Box<dyn Simulator>>;

/// [`Simulator`] backed by `force_graph`.
pub struct ForceGraphSimulator {
	graph: ForceGraph<usize, ()>,
	nodes: Vec<DefaultNodeIdx>,
	positions: Vec<Point>,
	pinned: Vec<bool>,
	center: Point,
}

impl ForceGraphSimulator {
	pub fn new(config: &SimulationConfig, nodes: &[SimNode], links: &[(usize, usize)]) -> Self {
		// Spring stiffness scales inversely with the rest length; 0.05 at 150.
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: (-config.charge_strength * 0.3) as f32,
			force_spring: (0.05 * 150.0 / config.link_distance) as f32,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let indices = nodes
			.iter()
			.enumerate()
			.map(|(ordinal, node)| {
				let at = node.pinned.unwrap_or(node.position);
				graph.add_node(NodeData {
					x: at.x as f32,
					y: at.y as f32,
					mass: 10.0,
					is_anchor: node.pinned.is_some(),
					user_data: ordinal,
				})
			})
			.collect::<Vec<_>>();

		for &(source, target) in links {
			if source == target {
				continue;
			}
			if let (Some(&a), Some(&b)) = (indices.get(source), indices.get(target)) {
				graph.add_edge(a, b, EdgeData::default());
			}
		}

		Self {
			graph,
			nodes: indices,
			positions: nodes.iter().map(|n| n.pinned.unwrap_or(n.position)).collect(),
			pinned: nodes.iter().map(|n| n.pinned.is_some()).collect(),
			center: config.center,
		}
	}

	/// Translates free vertices so the centroid sits on the canvas center.
	fn recenter(&mut self) {
		if self.positions.is_empty() {
			return;
		}
		let n = self.positions.len() as f64;
		let (sx, sy) = self
			.positions
			.iter()
			.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
		let (dx, dy) = ((self.center.x - sx / n) as f32, (self.center.y - sy / n) as f32);
		let pinned = &self.pinned;
		self.graph.visit_nodes_mut(|node| {
			if !pinned.get(node.data.user_data).copied().unwrap_or(false) {
				node.data.x += dx;
				node.data.y += dy;
			}
		});
	}

	fn sync_positions(&mut self) {
		let positions = &mut self.positions;
		self.graph.visit_nodes(|node| {
			if let Some(slot) = positions.get_mut(node.data.user_data) {
				*slot = Point::new(node.x() as f64, node.y() as f64);
			}
		});
	}
}

impl Simulator for ForceGraphSimulator {
	fn step(&mut self, dt: f64) {
		self.graph.update(dt as f32);
		self.sync_positions();
		self.recenter();
		self.sync_positions();
	}

	fn position(&self, ordinal: usize) -> Option<Point> {
		self.positions.get(ordinal).copied()
	}

	fn pin(&mut self, ordinal: usize, at: Point) {
		let Some(&idx) = self.nodes.get(ordinal) else {
			return;
		};
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = at.x as f32;
				node.data.y = at.y as f32;
				node.data.is_anchor = true;
			}
		});
		self.pinned[ordinal] = true;
		self.positions[ordinal] = at;
	}

	fn release(&mut self, ordinal: usize) {
		let Some(&idx) = self.nodes.get(ordinal) else {
			return;
		};
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.is_anchor = false;
			}
		});
		self.pinned[ordinal] = false;
	}
}

/// Default factory producing [`ForceGraphSimulator`]s.
pub fn force_graph_factory() -> SimulatorFactory {
	Box::new(|config, nodes, links| Box::new(ForceGraphSimulator::new(config, nodes, links)))
}

/// Tick and convergence observers.
#[derive(Default)]
struct LayoutObserver {
	on_tick: Option<Box<dyn FnMut(&[EdgeGeometry])>>,
	/// One-shot: taken when the simulation first converges.
	on_end: Option<Box<dyn FnOnce()>>,
}

/// Drives an external simulator against the model's working sets.
pub struct LayoutDriver {
	config: SimulationConfig,
	vertex_radius: f64,
	factory: SimulatorFactory,
	simulator: Option<Box<dyn Simulator>>,
	/// Model generation the simulator's ordinals refer to.
	generation: u64,
	alpha: f64,
	alpha_target: f64,
	converged: bool,
	frame: Vec<EdgeGeometry>,
	observer: LayoutObserver,
	dragging: Option<String>,
}

impl LayoutDriver {
	pub fn new(config: SimulationConfig, vertex_radius: f64) -> Self {
		Self::with_factory(config, vertex_radius, force_graph_factory())
	}

	pub fn with_factory(config: SimulationConfig, vertex_radius: f64, factory: SimulatorFactory) -> Self {
		Self {
			config,
			vertex_radius,
			factory,
			simulator: None,
			generation: 0,
			alpha: 1.0,
			alpha_target: 0.0,
			converged: false,
			frame: Vec::new(),
			observer: LayoutObserver::default(),
			dragging: None,
		}
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn set_center(&mut self, center: Point) {
		self.config.center = center;
	}

	/// Registers a handler invoked with the edge geometry after every tick.
	pub fn on_tick(&mut self, handler: impl FnMut(&[EdgeGeometry]) + 'static) {
		self.observer.on_tick = Some(Box::new(handler));
	}

	/// Registers a handler fired once, the first time the layout converges.
	pub fn on_end(&mut self, handler: impl FnOnce() + 'static) {
		self.observer.on_end = Some(Box::new(handler));
	}

	pub fn is_running(&self) -> bool {
		self.simulator.is_some() && !self.converged
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Edge geometry from the most recent tick.
	pub fn frame(&self) -> &[EdgeGeometry] {
		&self.frame
	}

	/// Tears down any running simulator and builds one for the current sets.
	///
	/// Unconverged motion is discarded; pinned positions carry over. Does
	/// nothing while the model's index is stale.
	pub fn relayout(&mut self, model: &mut GraphModel) {
		let Some(index) = model.index() else {
			debug!("relation-graph: relayout skipped, index is stale");
			return;
		};

		let count = model.vertexes().len().max(1) as f64;
		let nodes: Vec<SimNode> = model
			.vertexes()
			.iter()
			.enumerate()
			.map(|(i, vertex)| {
				let seeded = vertex.x != 0.0 || vertex.y != 0.0;
				let position = if seeded {
					vertex.position()
				} else {
					let angle = i as f64 * 2.0 * PI / count;
					Point::new(
						self.config.center.x + SEED_RADIUS * angle.cos(),
						self.config.center.y + SEED_RADIUS * angle.sin(),
					)
				};
				SimNode {
					position,
					pinned: vertex.pinned(),
				}
			})
			.collect();
		let links: Vec<(usize, usize)> = model
			.edges()
			.iter()
			.filter_map(|e| Some((index.ordinals.ordinal(&e.from)?, index.ordinals.ordinal(&e.to)?)))
			.collect();

		self.simulator = Some((self.factory)(&self.config, &nodes, &links));
		self.generation = model.generation();
		self.alpha = 1.0;
		self.converged = false;
		if self.dragging.as_deref().is_some_and(|id| model.vertex_at(id).is_none()) {
			self.dragging = None;
			self.alpha_target = 0.0;
		}
		for (ordinal, node) in nodes.iter().enumerate() {
			model.set_position(ordinal, node.pinned.unwrap_or(node.position));
		}
		self.frame = geometry::compute_frame(model, self.vertex_radius);
		info!(
			"relation-graph: layout started ({} vertexes, {} links)",
			nodes.len(),
			links.len()
		);
	}

	/// Handles one simulator tick. Returns whether the layout is still running.
	pub fn tick(&mut self, model: &mut GraphModel, dt: f64) -> bool {
		if !self.is_running() {
			return false;
		}
		if model.index().is_none() {
			return true;
		}
		if self.generation != model.generation() {
			debug!("relation-graph: index changed under the running layout, rebuilding");
			self.relayout(model);
			return self.is_running();
		}
		let Some(simulator) = self.simulator.as_mut() else {
			return false;
		};

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		simulator.step(dt);
		for ordinal in 0..model.vertexes().len() {
			if let Some(at) = simulator.position(ordinal) {
				model.set_position(ordinal, at);
			}
		}

		self.frame = geometry::compute_frame(model, self.vertex_radius);
		if let Some(on_tick) = self.observer.on_tick.as_mut() {
			on_tick(&self.frame);
		}

		if self.alpha < ALPHA_MIN {
			self.converged = true;
			info!("relation-graph: layout converged");
			if let Some(on_end) = self.observer.on_end.take() {
				on_end();
			}
			return false;
		}
		true
	}

	/// Pins the vertex where it stands and wakes the simulation.
	pub fn drag_start(&mut self, model: &mut GraphModel, id: &str) {
		let Some(at) = model.vertex_at(id).map(|v| v.position()) else {
			return;
		};
		self.dragging = Some(id.to_string());
		self.pin(model, id, at);
		self.alpha_target = DRAG_ALPHA_TARGET;
		self.converged = false;
	}

	/// Moves the pin to the pointer, mapped through the viewport transform.
	pub fn drag_move(&mut self, model: &mut GraphModel, screen: Point, viewport: &ViewportController) {
		let Some(id) = self.dragging.clone() else {
			return;
		};
		if model.vertex_at(&id).is_none() {
			self.dragging = None;
			return;
		}
		self.pin(model, &id, viewport.invert(screen));
	}

	/// Releases the pin and lets the simulation cool back down.
	pub fn drag_end(&mut self, model: &mut GraphModel) {
		let Some(id) = self.dragging.take() else {
			return;
		};
		model.set_pin(&id, None);
		if let (Some(ordinal), Some(simulator)) = (self.ordinal(model, &id), self.simulator.as_mut()) {
			simulator.release(ordinal);
		}
		self.alpha_target = 0.0;
	}

	pub fn dragging(&self) -> Option<&str> {
		self.dragging.as_deref()
	}

	fn pin(&mut self, model: &mut GraphModel, id: &str, at: Point) {
		model.set_pin(id, Some(at));
		if let Some(ordinal) = model.index().and_then(|index| index.ordinals.ordinal(id)) {
			model.set_position(ordinal, at);
		}
		if let (Some(ordinal), Some(simulator)) = (self.ordinal(model, id), self.simulator.as_mut()) {
			simulator.pin(ordinal, at);
		}
	}

	/// Ordinal of `id` as known to the running simulator.
	fn ordinal(&self, model: &GraphModel, id: &str) -> Option<usize> {
		if self.generation != model.generation() {
			return None;
		}
		model.index()?.ordinals.ordinal(id)
	}
}
