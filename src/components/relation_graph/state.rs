//! Graph instance state and the operation surface offered to UI collaborators.
//!
//! [`RelationGraph`] is the single owner of the model and everything derived
//! from it. Collaborators (toolbars, search panels, the canvas component)
//! only go through its methods, which keeps the index and the simulation
//! consistent with the working sets.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use serde_json::Value;

use super::error::Result;
use super::geometry::EdgeGeometry;
use super::layout::{LayoutDriver, SimulationConfig, SimulatorFactory, force_graph_factory};
use super::linking::{LinkDraft, Linker};
use super::model::GraphModel;
use super::options::GraphOptions;
use super::path::{PathFinder, PathResult};
use super::selection::SelectionState;
use super::theme::Theme;
use super::types::{Collection, Edge, GraphCount, GraphData, Point, Vertex};
use super::viewport::{ViewTransform, ViewportController};

/// What a right click landed on.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickTarget {
	Vertex(String),
	Canvas,
}

/// Callback for right clicks, given the target and the model-space point.
pub type RightClickCallback = Box<dyn FnMut(&ClickTarget, Point)>;

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start: Point,
	pub transform_start: Point,
}

/// One graph instance: model, layout, viewport, selection and bindings.
pub struct RelationGraph {
	model: GraphModel,
	options: GraphOptions,
	layout: LayoutDriver,
	viewport: ViewportController,
	selection: SelectionState,
	linker: Linker,
	right_click: Option<RightClickCallback>,
	type_ordinals: HashMap<String, usize>,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
}

impl RelationGraph {
	pub fn new(data: GraphData, options: GraphOptions, width: f64, height: f64) -> Result<Self> {
		Self::with_factory(data, options, width, height, force_graph_factory())
	}

	/// Builds a graph from an untyped `{vertexes, edges}` payload.
	pub fn from_value(raw: &Value, options: GraphOptions, width: f64, height: f64) -> Result<Self> {
		let model = GraphModel::load(raw)?;
		Self::from_model(model, options, width, height, force_graph_factory())
	}

	/// Builds a graph whose layout runs on a custom simulator.
	pub fn with_factory(
		data: GraphData,
		options: GraphOptions,
		width: f64,
		height: f64,
		factory: SimulatorFactory,
	) -> Result<Self> {
		Self::from_model(GraphModel::new(data)?, options, width, height, factory)
	}

	fn from_model(
		model: GraphModel,
		options: GraphOptions,
		width: f64,
		height: f64,
		factory: SimulatorFactory,
	) -> Result<Self> {
		options.validate()?;
		let (width, height) = (options.width.unwrap_or(width), options.height.unwrap_or(height));
		let viewport = ViewportController::new(options.scale_extent, width, height);
		let config = SimulationConfig::from_options(&options, viewport.center());
		let theme = Theme::by_name(&options.theme).unwrap_or_default();

		let mut graph = Self {
			type_ordinals: model.type_ordinals(),
			layout: LayoutDriver::with_factory(config, options.r, factory),
			selection: SelectionState::new(theme),
			linker: Linker::default(),
			right_click: None,
			pan: PanState::default(),
			model,
			options,
			viewport,
			width,
			height,
		};
		graph.render();
		Ok(graph)
	}

	/// (Re)starts the layout for the current working sets.
	pub fn render(&mut self) {
		if self.model.index().is_none() {
			self.preprocess_data();
		} else {
			self.layout.relayout(&mut self.model);
		}
	}

	/// Rebuilds ordinals, adjacency and multiplicity from the working sets
	/// and restarts the layout against the rebuilt index.
	pub fn preprocess_data(&mut self) {
		self.model.rebuild_index();
		self.type_ordinals = self.model.type_ordinals();
		self.layout.relayout(&mut self.model);
	}

	pub fn filter_vertex(&mut self, predicate: impl Fn(&Vertex) -> bool, use_raw: bool) {
		self.selection.filter_vertex(&mut self.model, predicate, use_raw);
		self.after_filter();
	}

	pub fn filter_edge(&mut self, predicate: impl Fn(&Edge) -> bool, use_raw: bool) {
		self.selection.filter_edge(&mut self.model, predicate, use_raw);
		self.after_filter();
	}

	pub fn filter_vertex_by(&mut self, descriptor: &Value, use_raw: bool) -> Result<()> {
		self.selection.filter_vertex_by(&mut self.model, descriptor, use_raw)?;
		self.after_filter();
		Ok(())
	}

	pub fn filter_edge_by(&mut self, descriptor: &Value, use_raw: bool) -> Result<()> {
		self.selection.filter_edge_by(&mut self.model, descriptor, use_raw)?;
		self.after_filter();
		Ok(())
	}

	fn after_filter(&mut self) {
		self.type_ordinals = self.model.type_ordinals();
		let orphaned = self
			.linker
			.draft()
			.is_some_and(|draft| self.model.vertex_at(&draft.from).is_none());
		if orphaned {
			debug!("relation-graph: link source filtered out, draft cancelled");
			self.linker.cancel();
		}
		self.layout.relayout(&mut self.model);
	}

	/// Restores the original data; call [`Self::render`] to lay it out again.
	pub fn reset_data(&mut self) {
		self.selection.reset_data(&mut self.model);
		self.linker.cancel();
	}

	pub fn shortest_path(&self, source: &str, target: &str) -> PathResult {
		PathFinder::new(&self.model).shortest_path(source, target)
	}

	/// The vertex and its one-hop outgoing neighborhood.
	pub fn get_highlight_ids(&self, vertex: &str) -> PathResult {
		PathFinder::new(&self.model).radiation_vertex(vertex)
	}

	/// The vertex and every vertex connected to it in either direction.
	pub fn get_relation_ids(&self, vertex: &str) -> PathResult {
		PathFinder::new(&self.model).relation_vertex(vertex)
	}

	pub fn highlight_vertex<S: AsRef<str>>(&mut self, ids: &[S]) {
		self.selection.highlight_vertex(&mut self.model, ids);
	}

	pub fn highlight_edge<S: AsRef<str>>(&mut self, ids: &[S]) {
		self.selection.highlight_edge(&mut self.model, ids);
	}

	pub fn clear_highlight(&mut self) {
		self.selection.clear_highlight(&mut self.model);
	}

	pub fn change_theme(&mut self, name: &str) -> bool {
		self.selection.change_theme(name)
	}

	pub fn zoom_to(&mut self, scale: f64) -> bool {
		self.viewport.zoom_to(scale)
	}

	pub fn transform_to(&mut self, transform: ViewTransform) -> bool {
		self.viewport.transform_to(transform)
	}

	pub fn get_count(&self) -> GraphCount {
		self.model.count()
	}

	pub fn count_by_type(&self, collection: Collection) -> BTreeMap<String, usize> {
		self.model.count_by_type(collection)
	}

	pub fn get_vertex_by_id(&self, id: &str) -> Option<&Vertex> {
		self.model.vertex_at(id)
	}

	pub fn get_edge_by_id(&self, id: &str) -> Option<&Edge> {
		self.model.edge_at(id)
	}

	pub fn bind_right_click(&mut self, callback: impl FnMut(&ClickTarget, Point) + 'static) {
		self.right_click = Some(Box::new(callback));
	}

	pub fn bind_line_with(&mut self, callback: impl FnMut(&str, &str) + 'static) {
		self.linker.bind(callback);
	}

	/// Observes the edge geometry produced by every layout tick.
	pub fn on_tick(&mut self, handler: impl FnMut(&[EdgeGeometry]) + 'static) {
		self.layout.on_tick(handler);
	}

	/// Fires once, when the current layout first converges.
	pub fn on_layout_end(&mut self, handler: impl FnOnce() + 'static) {
		self.layout.on_end(handler);
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn options(&self) -> &GraphOptions {
		&self.options
	}

	pub fn theme(&self) -> &Theme {
		self.selection.theme()
	}

	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	pub fn frame(&self) -> &[EdgeGeometry] {
		self.layout.frame()
	}

	pub fn link_draft(&self) -> Option<&LinkDraft> {
		self.linker.draft()
	}

	pub fn is_animating(&self) -> bool {
		self.layout.is_running()
	}

	/// Palette slot for a vertex type.
	pub fn type_ordinal(&self, kind: Option<&str>) -> usize {
		self.type_ordinals
			.get(kind.unwrap_or_default())
			.copied()
			.unwrap_or(0)
	}

	/// Advances the layout by one frame.
	pub fn tick(&mut self, dt: f64) -> bool {
		self.layout.tick(&mut self.model, dt)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.viewport.resize(width, height);
		self.layout.set_center(self.viewport.center());
	}

	pub fn screen_to_graph(&self, screen: Point) -> Point {
		self.viewport.invert(screen)
	}

	/// Topmost vertex under a screen point.
	pub fn vertex_at_position(&self, screen: Point) -> Option<String> {
		let at = self.screen_to_graph(screen);
		self.model
			.vertexes()
			.iter()
			.rev()
			.find(|v| v.position().distance(at) <= self.options.r)
			.map(|v| v.id.clone())
	}

	pub fn drag_start(&mut self, id: &str) -> bool {
		if !self.options.dragable {
			return false;
		}
		self.layout.drag_start(&mut self.model, id);
		self.layout.dragging().is_some()
	}

	pub fn drag_move(&mut self, screen: Point) {
		self.layout.drag_move(&mut self.model, screen, &self.viewport);
	}

	pub fn drag_end(&mut self) {
		self.layout.drag_end(&mut self.model);
	}

	pub fn is_dragging(&self) -> bool {
		self.layout.dragging().is_some()
	}

	pub fn pan_start(&mut self, screen: Point) {
		let t = self.viewport.transform();
		self.pan = PanState {
			active: true,
			start: screen,
			transform_start: Point::new(t.x, t.y),
		};
	}

	pub fn pan_move(&mut self, screen: Point) {
		if !self.pan.active {
			return;
		}
		let t = self.viewport.transform();
		self.viewport.transform_to(ViewTransform {
			x: self.pan.transform_start.x + (screen.x - self.pan.start.x),
			y: self.pan.transform_start.y + (screen.y - self.pan.start.y),
			k: t.k,
		});
	}

	pub fn pan_end(&mut self) {
		self.pan.active = false;
	}

	/// Steps the zoom for one wheel notch; ignored unless scalable.
	pub fn wheel(&mut self, delta_y: f64) -> bool {
		if !self.options.scalable {
			return false;
		}
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.viewport.zoom_by(factor)
	}

	/// Dispatches a right click at a screen point to the bound callback.
	pub fn right_click(&mut self, screen: Point) {
		let target = match self.vertex_at_position(screen) {
			Some(id) => ClickTarget::Vertex(id),
			None => ClickTarget::Canvas,
		};
		let at = self.screen_to_graph(screen);
		if let Some(callback) = self.right_click.as_mut() {
			callback(&target, at);
		}
	}

	/// Highlights a clicked vertex's neighborhood, or clears on empty canvas.
	pub fn click(&mut self, screen: Point) {
		match self.vertex_at_position(screen) {
			Some(id) => {
				let ids = self.get_highlight_ids(&id);
				self.highlight_vertex(&ids.vertex_ids);
				self.highlight_edge(&ids.edge_ids);
			}
			None => self.clear_highlight(),
		}
	}

	/// Starts a provisional edge if a vertex is under the pointer.
	pub fn link_begin(&mut self, screen: Point) -> bool {
		let Some(id) = self.vertex_at_position(screen) else {
			return false;
		};
		let at = self.screen_to_graph(screen);
		self.linker.begin(&id, at)
	}

	pub fn link_drag(&mut self, screen: Point) {
		self.linker.drag(screen, &self.viewport);
	}

	pub fn link_cancel(&mut self) {
		self.linker.cancel();
	}

	pub fn is_linking(&self) -> bool {
		self.linker.draft().is_some()
	}

	/// Finishes a provisional edge; returns the id of a committed edge.
	pub fn link_release(&mut self, screen: Point) -> Option<String> {
		let target = self.vertex_at_position(screen);
		let (from, to) = self.linker.release(target.as_deref())?;

		let mut n = self.model.edges().len();
		let id = loop {
			let candidate = format!("{from}->{to}#{n}");
			if self.model.edge_at(&candidate).is_none() {
				break candidate;
			}
			n += 1;
		};
		match self.model.add_edge(Edge::new(id.clone(), from.clone(), to.clone())) {
			Ok(()) => {
				info!("relation-graph: committed edge {id}");
				self.linker.committed(&from, &to);
				self.layout.relayout(&mut self.model);
				Some(id)
			}
			Err(e) => {
				debug!("relation-graph: link not committed: {e}");
				None
			}
		}
	}
}
