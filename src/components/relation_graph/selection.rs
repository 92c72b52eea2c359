//! Highlight, filter and theme state.
//!
//! Highlighting only retags elements; the tags are the sole input the
//! renderer's color and width lookups consume. Filters replace the working
//! sets wholesale and rebuild the index, or fail before touching anything.

use std::collections::HashSet;

use log::{info, warn};
use serde_json::Value;

use super::error::{GraphError, Result};
use super::model::GraphModel;
use super::theme::Theme;
use super::types::{Edge, ElementState, Record, Vertex};

/// How a descriptor predicate compares a field.
#[derive(Clone, Debug, PartialEq)]
enum Comparison {
	Equals(Value),
	OneOf(Vec<Value>),
	Contains(String),
}

/// Declarative predicate a UI collaborator can send as JSON.
///
/// Accepted shapes: `{"field": f, "equals": v}`, `{"field": f, "in": [..]}`
/// and `{"field": f, "contains": "text"}`.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldPredicate {
	field: String,
	comparison: Comparison,
}

impl FieldPredicate {
	pub fn matches(&self, record: &impl Record) -> bool {
		let Some(value) = record.field(&self.field) else {
			return false;
		};
		match &self.comparison {
			Comparison::Equals(expected) => &value == expected,
			Comparison::OneOf(options) => options.contains(&value),
			Comparison::Contains(needle) => value.as_str().is_some_and(|s| s.contains(needle.as_str())),
		}
	}
}

impl TryFrom<&Value> for FieldPredicate {
	type Error = GraphError;

	fn try_from(descriptor: &Value) -> Result<Self> {
		let invalid = || GraphError::PredicateType(descriptor.to_string());
		let object = descriptor.as_object().ok_or_else(invalid)?;
		let field = object
			.get("field")
			.and_then(Value::as_str)
			.ok_or_else(invalid)?
			.to_string();

		let comparison = if let Some(expected) = object.get("equals") {
			Comparison::Equals(expected.clone())
		} else if let Some(options) = object.get("in") {
			Comparison::OneOf(options.as_array().ok_or_else(invalid)?.clone())
		} else if let Some(needle) = object.get("contains") {
			Comparison::Contains(needle.as_str().ok_or_else(invalid)?.to_string())
		} else {
			return Err(invalid());
		};
		Ok(Self { field, comparison })
	}
}

/// Chooses which vertex/edge sets a filter starts from.
fn source_sets(model: &GraphModel, use_raw: bool) -> (&[Vertex], &[Edge]) {
	if use_raw {
		(&model.raw().vertexes, &model.raw().edges)
	} else {
		(model.vertexes(), model.edges())
	}
}

/// Vertices touched by at least one of `edges`, in source order.
fn touched(vertexes: &[Vertex], edges: &[Edge]) -> Vec<Vertex> {
	let ends: HashSet<&str> = edges
		.iter()
		.flat_map(|e| [e.from.as_str(), e.to.as_str()])
		.collect();
	vertexes
		.iter()
		.filter(|v| ends.contains(v.id.as_str()))
		.cloned()
		.collect()
}

/// Selection, filter and theme state for one graph.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
	theme: Theme,
}

impl SelectionState {
	pub fn new(theme: Theme) -> Self {
		Self { theme }
	}

	pub fn theme(&self) -> &Theme {
		&self.theme
	}

	/// Switches to a named theme; unknown names leave the theme unchanged.
	pub fn change_theme(&mut self, name: &str) -> bool {
		match Theme::by_name(name) {
			Some(theme) => {
				info!("relation-graph: theme changed to {name}");
				self.theme = theme;
				true
			}
			None => {
				warn!("relation-graph: unknown theme {name:?}");
				false
			}
		}
	}

	/// Tags vertices in `ids` as highlighted and every other vertex grey.
	pub fn highlight_vertex<S: AsRef<str>>(&self, model: &mut GraphModel, ids: &[S]) {
		let ids: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
		for vertex in model.vertexes_mut() {
			vertex.state = if ids.contains(vertex.id.as_str()) {
				ElementState::Highlight
			} else {
				ElementState::Grey
			};
		}
	}

	/// Tags edges in `ids` as highlighted and every other edge grey.
	pub fn highlight_edge<S: AsRef<str>>(&self, model: &mut GraphModel, ids: &[S]) {
		let ids: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
		for edge in model.edges_mut() {
			edge.state = if ids.contains(edge.id.as_str()) {
				ElementState::Highlight
			} else {
				ElementState::Grey
			};
		}
	}

	pub fn clear_highlight(&self, model: &mut GraphModel) {
		model.clear_states();
	}

	/// Keeps vertices matching `predicate` that also have a surviving edge.
	///
	/// Edges survive when they touch a matching vertex; the final vertex set
	/// is exactly the vertices those edges touch, so isolated matches drop out.
	pub fn filter_vertex(&self, model: &mut GraphModel, predicate: impl Fn(&Vertex) -> bool, use_raw: bool) {
		let (vertexes, edges) = source_sets(model, use_raw);
		let kept: HashSet<&str> = vertexes
			.iter()
			.filter(|&v| predicate(v))
			.map(|v| v.id.as_str())
			.collect();
		let edges: Vec<Edge> = edges
			.iter()
			.filter(|e| kept.contains(e.from.as_str()) || kept.contains(e.to.as_str()))
			.cloned()
			.collect();
		let vertexes = touched(vertexes, &edges);
		info!(
			"relation-graph: vertex filter kept {} vertexes, {} edges",
			vertexes.len(),
			edges.len()
		);
		model.replace(vertexes, edges);
	}

	/// Keeps edges matching `predicate` and the vertices they touch.
	pub fn filter_edge(&self, model: &mut GraphModel, predicate: impl Fn(&Edge) -> bool, use_raw: bool) {
		let (vertexes, edges) = source_sets(model, use_raw);
		let edges: Vec<Edge> = edges.iter().filter(|&e| predicate(e)).cloned().collect();
		let vertexes = touched(vertexes, &edges);
		info!(
			"relation-graph: edge filter kept {} vertexes, {} edges",
			vertexes.len(),
			edges.len()
		);
		model.replace(vertexes, edges);
	}

	/// [`Self::filter_vertex`] driven by a JSON predicate descriptor.
	pub fn filter_vertex_by(&self, model: &mut GraphModel, descriptor: &Value, use_raw: bool) -> Result<()> {
		let predicate = FieldPredicate::try_from(descriptor)?;
		self.filter_vertex(model, |v| predicate.matches(v), use_raw);
		Ok(())
	}

	/// [`Self::filter_edge`] driven by a JSON predicate descriptor.
	pub fn filter_edge_by(&self, model: &mut GraphModel, descriptor: &Value, use_raw: bool) -> Result<()> {
		let predicate = FieldPredicate::try_from(descriptor)?;
		self.filter_edge(model, |e| predicate.matches(e), use_raw);
		Ok(())
	}

	/// Restores the working sets from the raw snapshot; the index stays stale
	/// until the next preprocessing call.
	pub fn reset_data(&self, model: &mut GraphModel) {
		model.reset();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn model() -> GraphModel {
		GraphModel::load(&json!({
			"vertexes": [
				{"_id": "A", "type": "person"},
				{"_id": "B", "type": "person"},
				{"_id": "C", "type": "company"},
				{"_id": "D", "type": "person"},
				{"_id": "E", "type": "company"}
			],
			"edges": [
				{"_id": "e1", "_from": "A", "_to": "B", "label": "knows"},
				{"_id": "e2", "_from": "B", "_to": "C", "label": "works_at"},
				{"_id": "e3", "_from": "E", "_to": "C", "label": "owns"}
			]
		}))
		.unwrap()
	}

	fn ids<T: Record>(items: &[T]) -> Vec<&str> {
		items.iter().map(Record::id).collect()
	}

	fn is_company(v: &Vertex) -> bool {
		v.kind.as_deref() == Some("company")
	}

	#[test]
	fn test_highlight_tags_members_and_greys_the_rest() {
		let mut model = model();
		let selection = SelectionState::default();
		selection.highlight_vertex(&mut model, &["A", "B"]);
		selection.highlight_edge(&mut model, &["e1"]);

		assert_eq!(model.vertex_at("A").unwrap().state, ElementState::Highlight);
		assert_eq!(model.vertex_at("C").unwrap().state, ElementState::Grey);
		assert_eq!(model.edge_at("e1").unwrap().state, ElementState::Highlight);
		assert_eq!(model.edge_at("e2").unwrap().state, ElementState::Grey);

		selection.clear_highlight(&mut model);
		assert!(model.vertexes().iter().all(|v| v.state == ElementState::Normal));
	}

	#[test]
	fn test_filter_vertex_drops_isolated_matches() {
		let mut model = model();
		let selection = SelectionState::default();
		// D is a person with no edges.
		selection.filter_vertex(&mut model, |v| v.kind.as_deref() == Some("person"), false);
		assert_eq!(ids(model.vertexes()), vec!["A", "B", "C"]);
		assert_eq!(ids(model.edges()), vec!["e1", "e2"]);
		assert!(model.index().is_some());
	}

	#[test]
	fn test_filter_vertex_is_idempotent() {
		let selection = SelectionState::default();
		for use_raw in [false, true] {
			let mut model = model();
			selection.filter_vertex(&mut model, is_company, use_raw);
			let once = (model.vertexes().to_vec(), model.edges().to_vec());
			selection.filter_vertex(&mut model, is_company, use_raw);
			assert_eq!((model.vertexes().to_vec(), model.edges().to_vec()), once);
		}
	}

	#[test]
	fn test_filter_edge_keeps_touched_vertices() {
		let mut model = model();
		let selection = SelectionState::default();
		selection.filter_edge(&mut model, |e| e.label.as_deref() == Some("owns"), false);
		assert_eq!(ids(model.vertexes()), vec!["C", "E"]);
		assert_eq!(ids(model.edges()), vec!["e3"]);
	}

	#[test]
	fn test_raw_filter_ignores_previous_filters() {
		let mut model = model();
		let selection = SelectionState::default();
		selection.filter_edge(&mut model, |e| e.id == "e3", false);
		selection.filter_vertex(&mut model, |v| v.id == "A", false);
		assert!(model.vertexes().is_empty());

		selection.filter_vertex(&mut model, |v| v.id == "A", true);
		assert_eq!(ids(model.vertexes()), vec!["A", "B"]);
	}

	#[test]
	fn test_reset_restores_original_input() {
		let mut model = model();
		let original = model.raw().clone();
		let selection = SelectionState::default();
		selection.highlight_vertex(&mut model, &["A"]);
		selection.filter_vertex(&mut model, is_company, false);
		selection.filter_edge(&mut model, |e| e.id == "e3", true);

		selection.reset_data(&mut model);
		assert_eq!(model.vertexes(), original.vertexes.as_slice());
		assert_eq!(model.edges(), original.edges.as_slice());
		assert!(model.index().is_none());
	}

	#[test]
	fn test_working_set_mutation_never_reaches_snapshot() {
		let mut model = model();
		let selection = SelectionState::default();
		selection.highlight_vertex(&mut model, &["A"]);
		assert_eq!(model.raw().vertexes[0].state, ElementState::Normal);
		assert_eq!(model.vertexes()[0].state, ElementState::Highlight);
	}

	#[test]
	fn test_descriptor_filters() {
		let mut model = model();
		let selection = SelectionState::default();
		selection
			.filter_edge_by(&mut model, &json!({"field": "label", "in": ["knows", "owns"]}), false)
			.unwrap();
		assert_eq!(ids(model.edges()), vec!["e1", "e3"]);

		selection
			.filter_vertex_by(&mut model, &json!({"field": "_id", "contains": "E"}), true)
			.unwrap();
		assert_eq!(ids(model.vertexes()), vec!["C", "E"]);
	}

	#[test]
	fn test_invalid_descriptor_fails_before_mutation() {
		let mut model = model();
		let selection = SelectionState::default();
		let before = (model.vertexes().to_vec(), model.edges().to_vec());

		for descriptor in [json!("not a predicate"), json!({"field": "type"}), json!({"equals": 1})] {
			let result = selection.filter_vertex_by(&mut model, &descriptor, false);
			assert!(matches!(result, Err(GraphError::PredicateType(_))));
		}
		assert_eq!((model.vertexes().to_vec(), model.edges().to_vec()), before);
		assert!(model.index().is_some());
	}

	#[test]
	fn test_unknown_theme_is_ignored() {
		let mut selection = SelectionState::default();
		assert!(!selection.change_theme("neon"));
		assert_eq!(selection.theme().name, "default");
		assert!(selection.change_theme("midnight"));
		assert_eq!(selection.theme().name, "midnight");
	}
}
