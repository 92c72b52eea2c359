//! Graph model: validated working sets, the raw snapshot, and derived indexes.
//!
//! The model owns three things:
//! - an immutable deep copy of the input, restored verbatim by [`GraphModel::reset`]
//! - the working vertex/edge sets that filters replace wholesale
//! - a [`GraphIndex`] (ordinal map + adjacency) derived from the working sets
//!
//! The index is dropped whenever the working sets change and only rebuilt by
//! [`GraphModel::rebuild_index`], so a stale index can never be queried.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info, warn};
use serde_json::Value;

use super::error::{GraphError, Result};
use super::types::{Collection, Edge, ElementState, GraphCount, GraphData, LabelDirection, Point, Vertex};

/// Bijection between vertex ids and dense ordinals used by array-based algorithms.
#[derive(Clone, Debug, Default)]
pub struct VertexOrdinalMap {
	by_id: HashMap<String, usize>,
	ids: Vec<String>,
}

impl VertexOrdinalMap {
	fn build(vertexes: &[Vertex]) -> Self {
		let mut map = Self::default();
		for vertex in vertexes {
			map.by_id.insert(vertex.id.clone(), map.ids.len());
			map.ids.push(vertex.id.clone());
		}
		map
	}

	pub fn ordinal(&self, id: &str) -> Option<usize> {
		self.by_id.get(id).copied()
	}

	pub fn id(&self, ordinal: usize) -> Option<&str> {
		self.ids.get(ordinal).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}
}

/// Source ordinal -> target ordinal -> edge ids in encounter order.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyIndex {
	outgoing: Vec<BTreeMap<usize, Vec<String>>>,
}

impl AdjacencyIndex {
	fn with_vertices(count: usize) -> Self {
		Self {
			outgoing: vec![BTreeMap::new(); count],
		}
	}

	fn insert(&mut self, source: usize, target: usize, edge_id: &str) {
		self.outgoing[source]
			.entry(target)
			.or_default()
			.push(edge_id.to_string());
	}

	/// Targets reachable from `source` by one edge, in ascending ordinal order.
	pub fn targets(&self, source: usize) -> impl Iterator<Item = usize> + '_ {
		self.outgoing
			.get(source)
			.into_iter()
			.flat_map(|targets| targets.keys().copied())
	}

	/// Edge ids running from `source` to `target`, first-encountered first.
	pub fn edges(&self, source: usize, target: usize) -> &[String] {
		self.outgoing
			.get(source)
			.and_then(|targets| targets.get(&target))
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	/// Every outgoing `(target, edge ids)` entry for `source`.
	pub fn outgoing(&self, source: usize) -> impl Iterator<Item = (usize, &[String])> + '_ {
		self.outgoing
			.get(source)
			.into_iter()
			.flat_map(|targets| targets.iter().map(|(t, ids)| (*t, ids.as_slice())))
	}
}

/// Indexes derived from the working sets; always built together.
#[derive(Clone, Debug, Default)]
pub struct GraphIndex {
	pub ordinals: VertexOrdinalMap,
	pub adjacency: AdjacencyIndex,
	edge_positions: HashMap<String, usize>,
}

/// Per unordered pair bookkeeping while assigning multiplicity metadata.
struct PairTally<'a> {
	count: usize,
	first_from: &'a str,
}

fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
	if a <= b { (a, b) } else { (b, a) }
}

/// Assigns edgeIndex, siblingNum and labelDirection in edge encounter order.
fn assign_multiplicity(edges: &mut [Edge]) -> usize {
	let (ranks, siblings, pairs) = {
		let mut ranks = Vec::with_capacity(edges.len());
		let mut tallies: HashMap<(&str, &str), PairTally<'_>> = HashMap::new();
		for edge in edges.iter() {
			let tally = tallies
				.entry(pair_key(&edge.from, &edge.to))
				.or_insert(PairTally {
					count: 0,
					first_from: &edge.from,
				});
			tally.count += 1;
			let direction = if edge.from == tally.first_from {
				LabelDirection::Forward
			} else {
				LabelDirection::Reverse
			};
			ranks.push((tally.count, direction));
		}

		let siblings: Vec<usize> = edges
			.iter()
			.map(|edge| tallies[&pair_key(&edge.from, &edge.to)].count)
			.collect();
		(ranks, siblings, tallies.len())
	};

	for ((edge, (rank, direction)), sibling_num) in edges.iter_mut().zip(ranks).zip(siblings) {
		edge.edge_index = rank;
		edge.sibling_num = sibling_num;
		edge.label_direction = direction;
	}
	pairs
}

/// Checks that vertex ids are unique and every edge endpoint resolves.
fn check_endpoints(data: &GraphData) -> Result<()> {
	let mut ids = HashSet::with_capacity(data.vertexes.len());
	for vertex in &data.vertexes {
		if !ids.insert(vertex.id.as_str()) {
			return Err(GraphError::Schema(format!(
				"duplicate vertex id {:?}",
				vertex.id
			)));
		}
	}
	for edge in &data.edges {
		for endpoint in [&edge.from, &edge.to] {
			if !ids.contains(endpoint.as_str()) {
				return Err(GraphError::Schema(format!(
					"edge {:?} references unknown vertex {:?}",
					edge.id, endpoint
				)));
			}
		}
	}
	Ok(())
}

/// Validates the collection shapes of a raw JSON payload and deserializes it.
fn parse_raw(raw: &Value) -> Result<GraphData> {
	let collection = |key: &str| {
		raw.get(key)
			.and_then(Value::as_array)
			.ok_or_else(|| GraphError::Schema(format!("`{key}` must be an array")))
	};

	let vertexes = collection("vertexes")?
		.iter()
		.enumerate()
		.map(|(i, v)| {
			serde_json::from_value::<Vertex>(v.clone())
				.map_err(|e| GraphError::Schema(format!("vertexes[{i}]: {e}")))
		})
		.collect::<Result<Vec<_>>>()?;
	let edges = collection("edges")?
		.iter()
		.enumerate()
		.map(|(i, e)| {
			serde_json::from_value::<Edge>(e.clone())
				.map_err(|e| GraphError::Schema(format!("edges[{i}]: {e}")))
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(GraphData { vertexes, edges })
}

/// The exclusive owner of graph state for one graph instance.
#[derive(Clone, Debug)]
pub struct GraphModel {
	raw: GraphData,
	vertexes: Vec<Vertex>,
	edges: Vec<Edge>,
	index: Option<GraphIndex>,
	/// Bumped on every index rebuild.
	generation: u64,
}

impl GraphModel {
	/// Builds a model from an untyped payload, failing on malformed input.
	pub fn load(raw: &Value) -> Result<Self> {
		Self::new(parse_raw(raw)?)
	}

	/// Builds a model from typed data and preprocesses it.
	pub fn new(data: GraphData) -> Result<Self> {
		check_endpoints(&data)?;
		let mut model = Self {
			vertexes: data.vertexes.clone(),
			edges: data.edges.clone(),
			raw: data,
			index: None,
			generation: 0,
		};
		model.rebuild_index();
		info!(
			"relation-graph: loaded {} vertexes, {} edges",
			model.vertexes.len(),
			model.edges.len()
		);
		Ok(model)
	}

	/// Recomputes ordinals, adjacency and multiplicity from the working sets.
	pub fn rebuild_index(&mut self) {
		let pairs = assign_multiplicity(&mut self.edges);
		let ordinals = VertexOrdinalMap::build(&self.vertexes);
		let mut adjacency = AdjacencyIndex::with_vertices(ordinals.len());
		for edge in &self.edges {
			match (ordinals.ordinal(&edge.from), ordinals.ordinal(&edge.to)) {
				(Some(source), Some(target)) => adjacency.insert(source, target, &edge.id),
				_ => warn!("relation-graph: edge {:?} has a dangling endpoint", edge.id),
			}
		}
		let edge_positions = self
			.edges
			.iter()
			.enumerate()
			.map(|(i, edge)| (edge.id.clone(), i))
			.collect();
		debug!(
			"relation-graph: index rebuilt ({} vertexes, {} edges, {} pairs)",
			ordinals.len(),
			self.edges.len(),
			pairs
		);
		self.index = Some(GraphIndex {
			ordinals,
			adjacency,
			edge_positions,
		});
		self.generation += 1;
	}

	/// Identifies the current index; ordinals are only comparable within one generation.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// The derived index, or `None` while it is stale.
	pub fn index(&self) -> Option<&GraphIndex> {
		self.index.as_ref()
	}

	pub fn vertexes(&self) -> &[Vertex] {
		&self.vertexes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// The untouched input snapshot.
	pub fn raw(&self) -> &GraphData {
		&self.raw
	}

	pub fn vertex_at(&self, id: &str) -> Option<&Vertex> {
		match &self.index {
			Some(index) => index.ordinals.ordinal(id).and_then(|i| self.vertexes.get(i)),
			None => self.vertexes.iter().find(|v| v.id == id),
		}
	}

	pub fn edge_at(&self, id: &str) -> Option<&Edge> {
		match &self.index {
			Some(index) => index.edge_positions.get(id).and_then(|&i| self.edges.get(i)),
			None => self.edges.iter().find(|e| e.id == id),
		}
	}

	pub fn count(&self) -> GraphCount {
		GraphCount {
			vertexes: self.vertexes.len(),
			edges: self.edges.len(),
		}
	}

	/// Tallies vertexes by `type` or edges by `label`.
	///
	/// Elements without a type are counted under the empty string.
	pub fn count_by_type(&self, collection: Collection) -> BTreeMap<String, usize> {
		let mut counts = BTreeMap::new();
		let kinds: Box<dyn Iterator<Item = Option<&String>>> = match collection {
			Collection::Vertexes => Box::new(self.vertexes.iter().map(|v| v.kind.as_ref())),
			Collection::Edges => Box::new(self.edges.iter().map(|e| e.label.as_ref())),
		};
		for kind in kinds {
			*counts.entry(kind.cloned().unwrap_or_default()).or_insert(0) += 1;
		}
		counts
	}

	/// Ordinal of each vertex type among the sorted distinct types, for palette lookup.
	pub fn type_ordinals(&self) -> HashMap<String, usize> {
		self.count_by_type(Collection::Vertexes)
			.into_keys()
			.enumerate()
			.map(|(i, kind)| (kind, i))
			.collect()
	}

	/// Swaps in new working sets and rebuilds the index.
	pub(crate) fn replace(&mut self, vertexes: Vec<Vertex>, edges: Vec<Edge>) {
		self.vertexes = vertexes;
		self.edges = edges;
		self.rebuild_index();
	}

	/// Restores the working sets from the raw snapshot, leaving the index stale.
	pub(crate) fn reset(&mut self) {
		self.vertexes = self.raw.vertexes.clone();
		self.edges = self.raw.edges.clone();
		self.index = None;
	}

	/// Appends an edge between two existing vertices and rebuilds the index.
	pub(crate) fn add_edge(&mut self, edge: Edge) -> Result<()> {
		if self.vertex_at(&edge.from).is_none() || self.vertex_at(&edge.to).is_none() {
			return Err(GraphError::Schema(format!(
				"edge {:?} references an unknown vertex",
				edge.id
			)));
		}
		self.edges.push(edge);
		self.rebuild_index();
		Ok(())
	}

	pub(crate) fn set_position(&mut self, ordinal: usize, at: Point) {
		if let Some(vertex) = self.vertexes.get_mut(ordinal) {
			vertex.x = at.x;
			vertex.y = at.y;
		}
	}

	pub(crate) fn set_pin(&mut self, id: &str, pin: Option<Point>) {
		if let Some(vertex) = self.vertexes.iter_mut().find(|v| v.id == id) {
			vertex.fx = pin.map(|p| p.x);
			vertex.fy = pin.map(|p| p.y);
		}
	}

	pub(crate) fn vertexes_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
		self.vertexes.iter_mut()
	}

	pub(crate) fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
		self.edges.iter_mut()
	}

	/// Resets every element to the normal state.
	pub(crate) fn clear_states(&mut self) {
		for vertex in &mut self.vertexes {
			vertex.state = ElementState::Normal;
		}
		for edge in &mut self.edges {
			edge.state = ElementState::Normal;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn sample() -> Value {
		json!({
			"vertexes": [
				{"_id": "A", "type": "person"},
				{"_id": "B", "type": "person"},
				{"_id": "C", "type": "company"}
			],
			"edges": [
				{"_id": "e1", "_from": "A", "_to": "B", "label": "knows"},
				{"_id": "e2", "_from": "B", "_to": "A", "label": "knows"},
				{"_id": "e3", "_from": "A", "_to": "B"},
				{"_id": "e4", "_from": "B", "_to": "C", "label": "works_at"}
			]
		})
	}

	#[test]
	fn test_load_rejects_non_array_collections() {
		let result = GraphModel::load(&json!({"vertexes": {}, "edges": []}));
		assert!(matches!(result, Err(GraphError::Schema(_))));

		let result = GraphModel::load(&json!({"vertexes": []}));
		assert!(matches!(result, Err(GraphError::Schema(_))));
	}

	#[test]
	fn test_load_rejects_missing_identity() {
		let result = GraphModel::load(&json!({"vertexes": [{"name": "x"}], "edges": []}));
		assert!(matches!(result, Err(GraphError::Schema(_))));

		let result = GraphModel::load(&json!({
			"vertexes": [{"_id": "a"}],
			"edges": [{"_id": "e", "_from": "a"}]
		}));
		assert!(matches!(result, Err(GraphError::Schema(_))));
	}

	#[test]
	fn test_load_rejects_dangling_endpoint() {
		let result = GraphModel::load(&json!({
			"vertexes": [{"_id": "a"}],
			"edges": [{"_id": "e", "_from": "a", "_to": "zz"}]
		}));
		assert!(matches!(result, Err(GraphError::Schema(_))));
	}

	#[test]
	fn test_load_rejects_duplicate_vertex_id() {
		let result = GraphModel::load(&json!({
			"vertexes": [{"_id": "A"}, {"_id": "A", "name": "dup"}, {"_id": "B", "name": "bee"}],
			"edges": []
		}));
		assert!(matches!(result, Err(GraphError::Schema(_))));
	}

	#[test]
	fn test_every_edge_endpoint_resolves() {
		let model = GraphModel::load(&sample()).unwrap();
		for edge in model.edges() {
			assert!(model.vertex_at(&edge.from).is_some());
			assert!(model.vertex_at(&edge.to).is_some());
		}
	}

	#[test]
	fn test_multiplicity_metadata() {
		let model = GraphModel::load(&sample()).unwrap();
		let ab: Vec<&Edge> = model
			.edges()
			.iter()
			.filter(|e| pair_key(&e.from, &e.to) == ("A", "B"))
			.collect();
		let mut ranks: Vec<usize> = ab.iter().map(|e| e.edge_index).collect();
		ranks.sort_unstable();
		assert_eq!(ranks, vec![1, 2, 3]);
		assert!(ab.iter().all(|e| e.sibling_num == 3));

		let e2 = model.edge_at("e2").unwrap();
		assert_eq!(e2.label_direction, LabelDirection::Reverse);
		assert_eq!(model.edge_at("e3").unwrap().label_direction, LabelDirection::Forward);

		let e4 = model.edge_at("e4").unwrap();
		assert_eq!((e4.edge_index, e4.sibling_num), (1, 1));
	}

	#[test]
	fn test_adjacency_is_keyed_by_ordinal() {
		let model = GraphModel::load(&sample()).unwrap();
		let index = model.index().unwrap();
		let a = index.ordinals.ordinal("A").unwrap();
		let b = index.ordinals.ordinal("B").unwrap();
		assert_eq!(index.adjacency.edges(a, b), ["e1", "e3"]);
		assert_eq!(index.adjacency.edges(b, a), ["e2"]);
		assert_eq!(index.ordinals.id(b), Some("B"));
	}

	#[test]
	fn test_default_state_is_normal() {
		let model = GraphModel::load(&sample()).unwrap();
		assert!(model.vertexes().iter().all(|v| v.state == ElementState::Normal));
		assert!(model.edges().iter().all(|e| e.state == ElementState::Normal));
	}

	#[test]
	fn test_count_by_type() {
		let model = GraphModel::load(&sample()).unwrap();
		let vertexes = model.count_by_type(Collection::Vertexes);
		assert_eq!(vertexes.get("person"), Some(&2));
		assert_eq!(vertexes.get("company"), Some(&1));

		let edges = model.count_by_type(Collection::Edges);
		assert_eq!(edges.get("knows"), Some(&2));
		assert_eq!(edges.get(""), Some(&1));
		assert_eq!(model.count(), GraphCount { vertexes: 3, edges: 4 });
	}

	#[test]
	fn test_reset_leaves_index_stale_until_rebuilt() {
		let mut model = GraphModel::load(&sample()).unwrap();
		model.reset();
		assert!(model.index().is_none());
		assert!(model.vertex_at("A").is_some());
		model.rebuild_index();
		assert!(model.index().is_some());
	}

	#[test]
	fn test_lookup_miss_returns_none() {
		let model = GraphModel::load(&sample()).unwrap();
		assert!(model.vertex_at("nope").is_none());
		assert!(model.edge_at("nope").is_none());
	}
}
