//! Graph data structures: vertices, edges, and the raw input snapshot.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A point in model (simulation) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}
}

/// Display state tag driving every color and width lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
	Highlight,
	Grey,
	/// Also absorbs any unrecognized tag.
	#[default]
	#[serde(other)]
	Normal,
}

/// Which endpoint of an unordered pair was first seen as `_from`.
///
/// `Forward` means this edge runs in the same direction as the first edge
/// encountered for its pair; `Reverse` means it runs the other way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelDirection {
	#[default]
	Forward,
	Reverse,
}

/// Accepts both string and integer identities, normalizing to a string.
fn identity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Identity {
		Text(String),
		Number(i64),
	}

	Ok(match Identity::deserialize(deserializer)? {
		Identity::Text(text) => text,
		Identity::Number(number) => number.to_string(),
	})
}

/// A graph entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
	#[serde(rename = "_id", deserialize_with = "identity")]
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(default)]
	pub state: ElementState,
	#[serde(default)]
	pub x: f64,
	#[serde(default)]
	pub y: f64,
	/// Pinned x position; the simulator holds the vertex here while set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
	/// Any further caller-supplied attributes, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Vertex {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: None,
			kind: None,
			state: ElementState::Normal,
			x: 0.0,
			y: 0.0,
			fx: None,
			fy: None,
			extra: Map::new(),
		}
	}

	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn pinned(&self) -> Option<Point> {
		match (self.fx, self.fy) {
			(Some(x), Some(y)) => Some(Point::new(x, y)),
			_ => None,
		}
	}

	/// Text shown inside the vertex: the name, or the id when unnamed.
	pub fn display_name(&self) -> &str {
		self.name.as_deref().unwrap_or(&self.id)
	}
}

/// A directed connection between two vertices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	#[serde(rename = "_id", deserialize_with = "identity")]
	pub id: String,
	#[serde(rename = "_from", deserialize_with = "identity")]
	pub from: String,
	#[serde(rename = "_to", deserialize_with = "identity")]
	pub to: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(default)]
	pub state: ElementState,
	/// 1-based rank among edges sharing this unordered vertex pair.
	#[serde(rename = "edgeIndex", default)]
	pub edge_index: usize,
	/// Number of edges sharing this unordered vertex pair.
	#[serde(rename = "siblingNum", default)]
	pub sibling_num: usize,
	#[serde(rename = "labelDirection", default)]
	pub label_direction: LabelDirection,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Edge {
	pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			from: from.into(),
			to: to.into(),
			label: None,
			state: ElementState::Normal,
			edge_index: 0,
			sibling_num: 0,
			label_direction: LabelDirection::Forward,
			extra: Map::new(),
		}
	}

	pub fn is_self_loop(&self) -> bool {
		self.from == self.to
	}

	pub fn touches(&self, vertex_id: &str) -> bool {
		self.from == vertex_id || self.to == vertex_id
	}
}

/// Field access shared by vertices and edges, used by descriptor predicates.
pub trait Record {
	fn id(&self) -> &str;
	fn field(&self, name: &str) -> Option<Value>;
}

impl Record for Vertex {
	fn id(&self) -> &str {
		&self.id
	}

	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"_id" => Some(Value::from(self.id.as_str())),
			"name" => self.name.as_deref().map(Value::from),
			"type" => self.kind.as_deref().map(Value::from),
			"state" => serde_json::to_value(self.state).ok(),
			_ => self.extra.get(name).cloned(),
		}
	}
}

impl Record for Edge {
	fn id(&self) -> &str {
		&self.id
	}

	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"_id" => Some(Value::from(self.id.as_str())),
			"_from" => Some(Value::from(self.from.as_str())),
			"_to" => Some(Value::from(self.to.as_str())),
			"label" => self.label.as_deref().map(Value::from),
			"state" => serde_json::to_value(self.state).ok(),
			_ => self.extra.get(name).cloned(),
		}
	}
}

/// Complete graph data: vertexes and edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub vertexes: Vec<Vertex>,
	pub edges: Vec<Edge>,
}

/// Selects which working collection a count refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
	Vertexes,
	Edges,
}

/// Vertex and edge totals of the working sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphCount {
	pub vertexes: usize,
	pub edges: usize,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_vertex_defaults_state_and_keeps_extra_fields() {
		let vertex: Vertex =
			serde_json::from_value(json!({"_id": "a", "type": "person", "age": 42})).unwrap();
		assert_eq!(vertex.state, ElementState::Normal);
		assert_eq!(vertex.kind.as_deref(), Some("person"));
		assert_eq!(vertex.extra.get("age"), Some(&json!(42)));
		assert_eq!(vertex.display_name(), "a");
	}

	#[test]
	fn test_unknown_state_tag_reads_as_normal() {
		let vertex: Vertex = serde_json::from_value(json!({"_id": "a", "state": "selected"})).unwrap();
		assert_eq!(vertex.state, ElementState::Normal);
		let edge: Edge =
			serde_json::from_value(json!({"_id": "e", "_from": "a", "_to": "b", "state": "grey"})).unwrap();
		assert_eq!(edge.state, ElementState::Grey);
	}

	#[test]
	fn test_numeric_identity_is_normalized() {
		let edge: Edge = serde_json::from_value(json!({"_id": 7, "_from": 1, "_to": "b"})).unwrap();
		assert_eq!(edge.id, "7");
		assert_eq!(edge.from, "1");
		assert!(!edge.is_self_loop());
	}

	#[test]
	fn test_record_field_lookup() {
		let mut edge = Edge::new("e", "a", "b");
		edge.label = Some("knows".into());
		edge.extra.insert("weight".into(), json!(3));
		assert_eq!(edge.field("label"), Some(json!("knows")));
		assert_eq!(edge.field("weight"), Some(json!(3)));
		assert_eq!(edge.field("state"), Some(json!("normal")));
		assert_eq!(edge.field("missing"), None);
	}
}
