//! Breadth-first shortest paths and neighborhood queries over the adjacency index.
//!
//! Every query allocates its own visitation and predecessor storage, so a
//! query after a filter or relayout can never observe state from an earlier one.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use super::model::GraphModel;

/// Vertex ids and edge ids selected by a query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
	pub vertex_ids: Vec<String>,
	pub edge_ids: Vec<String>,
}

impl PathResult {
	fn only(vertex_id: &str) -> Self {
		Self {
			vertex_ids: vec![vertex_id.to_string()],
			edge_ids: Vec::new(),
		}
	}
}

/// Read-only query view over a model's current index.
pub struct PathFinder<'a> {
	model: &'a GraphModel,
}

impl<'a> PathFinder<'a> {
	pub fn new(model: &'a GraphModel) -> Self {
		Self { model }
	}

	/// Directed BFS from `source` to `target`.
	///
	/// Each hop uses the first edge recorded for that ordinal pair. An
	/// unreachable target, an unknown id, or `source == target` yields just
	/// the target with no edges.
	pub fn shortest_path(&self, source: &str, target: &str) -> PathResult {
		let Some(index) = self.model.index() else {
			return PathResult::only(target);
		};
		let (Some(start), Some(goal)) = (index.ordinals.ordinal(source), index.ordinals.ordinal(target))
		else {
			return PathResult::only(target);
		};
		if start == goal {
			return PathResult::only(target);
		}

		let mut visited = vec![false; index.ordinals.len()];
		let mut predecessor: Vec<Option<usize>> = vec![None; index.ordinals.len()];
		let mut queue = VecDeque::from([start]);
		visited[start] = true;

		'search: while let Some(current) = queue.pop_front() {
			for next in index.adjacency.targets(current) {
				if visited[next] {
					continue;
				}
				visited[next] = true;
				predecessor[next] = Some(current);
				if next == goal {
					break 'search;
				}
				queue.push_back(next);
			}
		}

		if !visited[goal] {
			return PathResult::only(target);
		}

		let mut ordinals = vec![goal];
		let mut cursor = goal;
		while let Some(previous) = predecessor[cursor] {
			ordinals.push(previous);
			cursor = previous;
		}
		ordinals.reverse();

		let edge_ids = ordinals
			.windows(2)
			.filter_map(|hop| index.adjacency.edges(hop[0], hop[1]).first().cloned())
			.collect();
		let vertex_ids = ordinals
			.iter()
			.filter_map(|&o| index.ordinals.id(o).map(str::to_string))
			.collect();
		PathResult {
			vertex_ids,
			edge_ids,
		}
	}

	/// `vertex` plus every vertex one outgoing edge away, with those edges.
	pub fn radiation_vertex(&self, vertex: &str) -> PathResult {
		let Some(index) = self.model.index() else {
			return PathResult::default();
		};
		let Some(origin) = index.ordinals.ordinal(vertex) else {
			return PathResult::default();
		};

		let mut result = PathResult::only(vertex);
		for (target, edges) in index.adjacency.outgoing(origin) {
			if target != origin {
				if let Some(id) = index.ordinals.id(target) {
					result.vertex_ids.push(id.to_string());
				}
			}
			result.edge_ids.extend(edges.iter().cloned());
		}
		result
	}

	/// `vertex` plus every vertex sharing an incident edge in either direction.
	pub fn relation_vertex(&self, vertex: &str) -> PathResult {
		if self.model.vertex_at(vertex).is_none() {
			return PathResult::default();
		}

		let mut seen = HashSet::from([vertex]);
		let mut result = PathResult::only(vertex);
		for edge in self.model.edges().iter().filter(|e| e.touches(vertex)) {
			result.edge_ids.push(edge.id.clone());
			let other = if edge.from == vertex { &edge.to } else { &edge.from };
			if seen.insert(other.as_str()) {
				result.vertex_ids.push(other.clone());
			}
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn ids(values: &[&str]) -> Vec<String> {
		values.iter().map(|v| v.to_string()).collect()
	}

	fn chain() -> GraphModel {
		GraphModel::load(&json!({
			"vertexes": [{"_id": "A"}, {"_id": "B"}, {"_id": "C"}, {"_id": "D"}],
			"edges": [
				{"_id": "e1", "_from": "A", "_to": "B"},
				{"_id": "e2", "_from": "B", "_to": "C"},
				{"_id": "e3", "_from": "A", "_to": "B"},
				{"_id": "e4", "_from": "C", "_to": "A"}
			]
		}))
		.unwrap()
	}

	#[test]
	fn test_shortest_path_follows_edges() {
		let model = chain();
		let path = PathFinder::new(&model).shortest_path("A", "C");
		assert_eq!(path.vertex_ids, ids(&["A", "B", "C"]));
		assert_eq!(path.edge_ids, ids(&["e1", "e2"]));
	}

	#[test]
	fn test_shortest_path_to_self() {
		let model = chain();
		let path = PathFinder::new(&model).shortest_path("B", "B");
		assert_eq!(path, PathResult::only("B"));
	}

	#[test]
	fn test_unreachable_target_returns_target_only() {
		let model = chain();
		let finder = PathFinder::new(&model);
		assert_eq!(finder.shortest_path("A", "D"), PathResult::only("D"));
		assert_eq!(finder.shortest_path("A", "missing"), PathResult::only("missing"));
	}

	#[test]
	fn test_repeated_queries_do_not_leak_state() {
		let model = chain();
		let finder = PathFinder::new(&model);
		let first = finder.shortest_path("C", "B");
		assert_eq!(first.vertex_ids, ids(&["C", "A", "B"]));
		assert_eq!(finder.shortest_path("A", "D"), PathResult::only("D"));
		assert_eq!(finder.shortest_path("C", "B"), first);
	}

	#[test]
	fn test_radiation_collects_outgoing_neighbors() {
		let model = chain();
		let result = PathFinder::new(&model).radiation_vertex("A");
		assert_eq!(result.vertex_ids, ids(&["A", "B"]));
		assert_eq!(result.edge_ids, ids(&["e1", "e3"]));
	}

	#[test]
	fn test_relation_collects_both_directions() {
		let model = chain();
		let result = PathFinder::new(&model).relation_vertex("A");
		assert_eq!(result.vertex_ids, ids(&["A", "B", "C"]));
		assert_eq!(result.edge_ids, ids(&["e1", "e3", "e4"]));
	}

	#[test]
	fn test_queries_on_stale_index_are_lookup_misses() {
		let mut model = chain();
		model.reset();
		let finder = PathFinder::new(&model);
		assert_eq!(finder.shortest_path("A", "C"), PathResult::only("C"));
		assert_eq!(finder.radiation_vertex("A"), PathResult::default());
	}
}
