//! Per-frame edge geometry for straight, parallel, and self-loop edges.
//!
//! Geometry is a pure function of the edge's multiplicity metadata and the
//! current endpoint positions, recomputed on every simulation tick. Each edge
//! also gets a reverse path (same curve, endpoints swapped) so its label can
//! always be laid out left-to-right.
//!
//! # Parallel edges
//!
//! For `n` edges sharing an unordered pair, the middle one (`edgeIndex ==
//! (n + 1) / 2`) is drawn straight. The others become circular arcs whose
//! radius shrinks with distance from the middle, so they fan out
//! symmetrically on both sides.

use std::collections::HashMap;
use std::fmt::Write as _;

use log::debug;

use super::model::GraphModel;
use super::types::{Edge, LabelDirection, Point};

/// Self-loop control point height per occurrence at the same vertex.
const LOOP_HEIGHT: f64 = 100.0;
/// Self-loop control point spread per occurrence at the same vertex.
const LOOP_WIDTH: f64 = 10.0;

/// One drawable edge curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgePath {
	Line {
		from: Point,
		to: Point,
	},
	/// SVG-style elliptical arc with equal radii and the small-arc flag.
	Arc {
		from: Point,
		to: Point,
		radius: f64,
		sweep: bool,
	},
	Cubic {
		from: Point,
		c1: Point,
		c2: Point,
		to: Point,
	},
}

impl EdgePath {
	/// The same curve traversed from the other end.
	pub fn reversed(self) -> Self {
		match self {
			EdgePath::Line { from, to } => EdgePath::Line { from: to, to: from },
			EdgePath::Arc {
				from,
				to,
				radius,
				sweep,
			} => EdgePath::Arc {
				from: to,
				to: from,
				radius,
				sweep: !sweep,
			},
			EdgePath::Cubic { from, c1, c2, to } => EdgePath::Cubic {
				from: to,
				c1: c2,
				c2: c1,
				to: from,
			},
		}
	}

	pub fn start(&self) -> Point {
		match *self {
			EdgePath::Line { from, .. } | EdgePath::Arc { from, .. } | EdgePath::Cubic { from, .. } => from,
		}
	}

	pub fn end(&self) -> Point {
		match *self {
			EdgePath::Line { to, .. } | EdgePath::Arc { to, .. } | EdgePath::Cubic { to, .. } => to,
		}
	}

	/// SVG path data, consumable by `Path2D` or an SVG `<path>` element.
	pub fn to_svg(&self) -> String {
		let mut d = String::new();
		let _ = match *self {
			EdgePath::Line { from, to } => write!(d, "M{},{} L{},{}", from.x, from.y, to.x, to.y),
			EdgePath::Arc {
				from,
				to,
				radius,
				sweep,
			} => write!(
				d,
				"M{},{} A{},{} 0 0,{} {},{}",
				from.x,
				from.y,
				radius,
				radius,
				u8::from(sweep),
				to.x,
				to.y
			),
			EdgePath::Cubic { from, c1, c2, to } => write!(
				d,
				"M{},{} C{},{} {},{} {},{}",
				from.x, from.y, c1.x, c1.y, c2.x, c2.y, to.x, to.y
			),
		};
		d
	}

	/// Midpoint of the curve and the tangent angle (radians) there.
	pub fn midpoint(&self) -> (Point, f64) {
		match *self {
			EdgePath::Line { from, to } => (
				Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0),
				(to.y - from.y).atan2(to.x - from.x),
			),
			EdgePath::Arc {
				from,
				to,
				radius,
				sweep,
			} => {
				let (dx, dy) = (to.x - from.x, to.y - from.y);
				let chord = dx.hypot(dy);
				let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
				let angle = dy.atan2(dx);
				if chord < f64::EPSILON {
					return (mid, angle);
				}
				// Radii smaller than half the chord are scaled up, as in SVG.
				let half = chord / 2.0;
				let r = radius.max(half);
				let sagitta = r - (r * r - half * half).max(0.0).sqrt();
				// In screen coordinates a positive sweep bulges to the left of travel.
				let (nx, ny) = if sweep {
					(dy / chord, -dx / chord)
				} else {
					(-dy / chord, dx / chord)
				};
				(Point::new(mid.x + nx * sagitta, mid.y + ny * sagitta), angle)
			}
			EdgePath::Cubic { from, c1, c2, to } => {
				let at = Point::new(
					0.125 * (from.x + 3.0 * c1.x + 3.0 * c2.x + to.x),
					0.125 * (from.y + 3.0 * c1.y + 3.0 * c2.y + to.y),
				);
				let tx = 0.75 * (c1.x - from.x) + 1.5 * (c2.x - c1.x) + 0.75 * (to.x - c2.x);
				let ty = 0.75 * (c1.y - from.y) + 1.5 * (c2.y - c1.y) + 0.75 * (to.y - c2.y);
				(at, ty.atan2(tx))
			}
		}
	}
}

/// Counts self-loops seen per vertex within a single geometry pass.
///
/// Create a fresh counter for every pass; counts must not carry over frames.
#[derive(Debug, Default)]
pub struct SelfLoopCounter {
	seen: HashMap<String, u32>,
}

impl SelfLoopCounter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one more loop at `vertex_id` and returns its 1-based occurrence.
	pub fn next(&mut self, vertex_id: &str) -> u32 {
		let count = self.seen.entry(vertex_id.to_string()).or_insert(0);
		*count += 1;
		*count
	}
}

/// Geometry of one edge for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
	pub edge_id: String,
	pub path: EdgePath,
	pub reverse: EdgePath,
	/// Whether the label should be hosted on `reverse` to stay upright.
	pub label_on_reverse: bool,
}

impl EdgeGeometry {
	/// The path the edge label is laid along.
	pub fn label_path(&self) -> &EdgePath {
		if self.label_on_reverse {
			&self.reverse
		} else {
			&self.path
		}
	}
}

/// Arc radius for a parallel edge, or `None` for the straight middle edge.
pub fn arc_radius(distance: f64, edge_index: usize, sibling_num: usize) -> Option<f64> {
	let middle = (sibling_num as f64 + 1.0) / 2.0;
	let index = edge_index as f64;
	if index == middle {
		return None;
	}
	let spread = ((index - middle).abs() * 0.7 + 1.0).ln() + 1.0 / (10.0 * index * index);
	Some(distance / spread)
}

/// Sweep flag for a parallel edge; mirrored edges get the flag inverted.
pub fn sweep_flag(edge_index: usize, sibling_num: usize, direction: LabelDirection) -> bool {
	let middle = (sibling_num as f64 + 1.0) / 2.0;
	let outward = edge_index as f64 > middle;
	match direction {
		LabelDirection::Forward => outward,
		LabelDirection::Reverse => !outward,
	}
}

/// Cubic loop anchored on the vertex boundary, growing with each occurrence.
pub fn self_loop(center: Point, radius: f64, occurrence: u32) -> EdgePath {
	let height = LOOP_HEIGHT * occurrence as f64;
	let width = LOOP_WIDTH * occurrence as f64;
	let from = Point::new(center.x, center.y - radius);
	let to = Point::new(center.x + radius, center.y);
	EdgePath::Cubic {
		from,
		c1: Point::new(from.x - width, from.y - height),
		c2: Point::new(to.x + height, to.y + width),
		to,
	}
}

/// Computes the forward path of an edge between two positions.
pub fn edge_path(edge: &Edge, source: Point, target: Point, radius: f64, loops: &mut SelfLoopCounter) -> EdgePath {
	if edge.is_self_loop() {
		return self_loop(source, radius, loops.next(&edge.from));
	}
	if edge.sibling_num <= 1 {
		return EdgePath::Line {
			from: source,
			to: target,
		};
	}
	match arc_radius(source.distance(target), edge.edge_index, edge.sibling_num) {
		Some(arc) => EdgePath::Arc {
			from: source,
			to: target,
			radius: arc,
			sweep: sweep_flag(edge.edge_index, edge.sibling_num, edge.label_direction),
		},
		None => EdgePath::Line {
			from: source,
			to: target,
		},
	}
}

/// Full geometry for one edge, including its reverse path and label host.
pub fn edge_geometry(edge: &Edge, source: Point, target: Point, radius: f64, loops: &mut SelfLoopCounter) -> EdgeGeometry {
	let path = edge_path(edge, source, target, radius, loops);
	EdgeGeometry {
		edge_id: edge.id.clone(),
		path,
		reverse: path.reversed(),
		label_on_reverse: source.x > target.x,
	}
}

/// Computes geometry for every edge of the model in one O(E) pass.
///
/// Returns an empty frame while the model's index is stale.
pub fn compute_frame(model: &GraphModel, radius: f64) -> Vec<EdgeGeometry> {
	let Some(index) = model.index() else {
		return Vec::new();
	};
	let vertexes = model.vertexes();
	let position = |id: &str| {
		index
			.ordinals
			.ordinal(id)
			.and_then(|i| vertexes.get(i))
			.map(|v| v.position())
	};

	let mut loops = SelfLoopCounter::new();
	model
		.edges()
		.iter()
		.filter_map(|edge| {
			let (source, target) = (position(&edge.from)?, position(&edge.to)?);
			Some(edge_geometry(edge, source, target, radius, &mut loops))
		})
		.collect()
}

/// Approximate glyph advance relative to the font size.
const GLYPH_WIDTH: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;
/// Share of the vertex diameter usable for text.
const TEXT_FILL: f64 = 0.8;

/// Wraps a vertex label into lines that fit inside a circle of `radius`.
///
/// Text that cannot fit is truncated with an ellipsis; a vertex too small for
/// even one glyph yields a single ellipsis rather than failing.
pub fn wrap_label(text: &str, radius: f64, font_size: f64) -> Vec<String> {
	let usable = 2.0 * radius * TEXT_FILL;
	let per_line = (usable / (font_size * GLYPH_WIDTH)).floor() as usize;
	let max_lines = ((usable / (font_size * LINE_HEIGHT)).floor() as usize).max(1);
	let chars: Vec<char> = text.chars().collect();

	if chars.is_empty() {
		return Vec::new();
	}
	if per_line == 0 {
		debug!("relation-graph: vertex too small for label {text:?}, truncating");
		return vec!["…".to_string()];
	}

	let mut lines: Vec<String> = chars
		.chunks(per_line)
		.map(|chunk| chunk.iter().collect())
		.collect();
	if lines.len() > max_lines {
		debug!("relation-graph: label {text:?} exceeds {max_lines} lines, truncating");
		lines.truncate(max_lines);
		if let Some(last) = lines.last_mut() {
			let mut kept: Vec<char> = last.chars().collect();
			kept.truncate(per_line.saturating_sub(1));
			kept.push('…');
			*last = kept.into_iter().collect();
		}
	}
	lines
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::relation_graph::types::{GraphData, Vertex};

	fn parallel(id: &str, from: &str, to: &str, index: usize, siblings: usize, direction: LabelDirection) -> Edge {
		let mut edge = Edge::new(id, from, to);
		edge.edge_index = index;
		edge.sibling_num = siblings;
		edge.label_direction = direction;
		edge
	}

	#[test]
	fn test_single_edge_is_straight() {
		let edge = parallel("e", "a", "b", 1, 1, LabelDirection::Forward);
		let mut loops = SelfLoopCounter::new();
		let path = edge_path(&edge, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 20.0, &mut loops);
		assert_eq!(
			path,
			EdgePath::Line {
				from: Point::new(0.0, 0.0),
				to: Point::new(10.0, 0.0)
			}
		);
	}

	#[test]
	fn test_two_parallel_edges_sweep_opposite_ways() {
		let mut loops = SelfLoopCounter::new();
		let (a, b) = (Point::new(0.0, 0.0), Point::new(100.0, 0.0));
		let e1 = parallel("e1", "A", "B", 1, 2, LabelDirection::Forward);
		let e2 = parallel("e2", "A", "B", 2, 2, LabelDirection::Forward);

		let (p1, p2) = (
			edge_path(&e1, a, b, 20.0, &mut loops),
			edge_path(&e2, a, b, 20.0, &mut loops),
		);
		match (p1, p2) {
			(EdgePath::Arc { sweep: s1, .. }, EdgePath::Arc { sweep: s2, .. }) => {
				assert!(!s1);
				assert!(s2);
			}
			other => panic!("expected two arcs, got {other:?}"),
		}
	}

	#[test]
	fn test_arc_radius_formula() {
		// middle = 1.5, |1 - 1.5| * 0.7 + 1 = 1.35
		let expected = 100.0 / (1.35f64.ln() + 0.1);
		let radius = arc_radius(100.0, 1, 2).unwrap();
		assert!((radius - expected).abs() < 1e-9);
	}

	#[test]
	fn test_middle_of_odd_siblings_is_straight() {
		assert_eq!(arc_radius(100.0, 2, 3), None);
		let edge = parallel("e", "a", "b", 2, 3, LabelDirection::Forward);
		let mut loops = SelfLoopCounter::new();
		let path = edge_path(&edge, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 20.0, &mut loops);
		assert!(matches!(path, EdgePath::Line { .. }));
	}

	#[test]
	fn test_reverse_direction_inverts_sweep() {
		assert!(!sweep_flag(1, 2, LabelDirection::Forward));
		assert!(sweep_flag(1, 2, LabelDirection::Reverse));
		assert!(!sweep_flag(3, 3, LabelDirection::Reverse));
	}

	#[test]
	fn test_self_loops_grow_per_occurrence() {
		let mut loops = SelfLoopCounter::new();
		let edge = Edge::new("l", "a", "a");
		let at = Point::new(0.0, 0.0);
		let first = edge_path(&edge, at, at, 20.0, &mut loops);
		let second = edge_path(&edge, at, at, 20.0, &mut loops);
		match (first, second) {
			(EdgePath::Cubic { c1: a, .. }, EdgePath::Cubic { c1: b, .. }) => {
				assert_eq!(a, Point::new(-10.0, -120.0));
				assert_eq!(b, Point::new(-20.0, -220.0));
			}
			other => panic!("expected cubic loops, got {other:?}"),
		}
	}

	#[test]
	fn test_loop_counter_resets_between_frames() {
		let mut data = GraphData::default();
		data.vertexes.push(Vertex::new("a"));
		data.edges.push(Edge::new("l", "a", "a"));
		let model = GraphModel::new(data).unwrap();

		let first = compute_frame(&model, 20.0);
		let second = compute_frame(&model, 20.0);
		assert_eq!(first, second);
	}

	#[test]
	fn test_reverse_path_swaps_endpoints_and_sweep() {
		let path = EdgePath::Arc {
			from: Point::new(0.0, 0.0),
			to: Point::new(5.0, 5.0),
			radius: 8.0,
			sweep: true,
		};
		let reverse = path.reversed();
		assert_eq!(reverse.start(), path.end());
		assert_eq!(reverse.end(), path.start());
		assert!(matches!(reverse, EdgePath::Arc { sweep: false, .. }));
		assert_eq!(reverse.reversed(), path);
	}

	#[test]
	fn test_label_hosted_on_reverse_when_pointing_left() {
		let edge = Edge::new("e", "a", "b");
		let mut loops = SelfLoopCounter::new();
		let left = edge_geometry(&edge, Point::new(10.0, 0.0), Point::new(0.0, 0.0), 20.0, &mut loops);
		assert!(left.label_on_reverse);
		assert!(left.label_path().start().x < left.label_path().end().x);

		let right = edge_geometry(&edge, Point::new(0.0, 0.0), Point::new(10.0, 0.0), 20.0, &mut loops);
		assert!(!right.label_on_reverse);
	}

	#[test]
	fn test_svg_output() {
		let arc = EdgePath::Arc {
			from: Point::new(0.0, 0.0),
			to: Point::new(10.0, 0.0),
			radius: 7.5,
			sweep: true,
		};
		assert_eq!(arc.to_svg(), "M0,0 A7.5,7.5 0 0,1 10,0");
	}

	#[test]
	fn test_arc_midpoint_sits_on_the_bulge() {
		// Half chord equals the radius: a semicircle with sagitta 5.
		let arc = EdgePath::Arc {
			from: Point::new(0.0, 0.0),
			to: Point::new(10.0, 0.0),
			radius: 5.0,
			sweep: true,
		};
		let (mid, angle) = arc.midpoint();
		assert!((mid.x - 5.0).abs() < 1e-9);
		assert!((mid.y + 5.0).abs() < 1e-9);
		assert_eq!(angle, 0.0);
	}

	#[test]
	fn test_wrap_label_fits_and_truncates() {
		// radius 20, font 12: 32px usable, 4 glyphs per line, 2 lines.
		assert_eq!(wrap_label("abcdefg", 20.0, 12.0), vec!["abcd", "efg"]);
		assert_eq!(wrap_label("abcdefghijkl", 20.0, 12.0), vec!["abcd", "efg…"]);
		assert_eq!(wrap_label("anything", 1.0, 12.0), vec!["…"]);
		assert!(wrap_label("", 20.0, 12.0).is_empty());
	}
}
