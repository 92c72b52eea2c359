//! Canvas rendering for the relation graph.
//!
//! Drawing happens in passes for z-ordering:
//! 1. Background (screen space)
//! 2. Edge paths, arrowheads and labels (world space)
//! 3. Vertices and their wrapped labels
//! 4. The provisional link, if one is being drawn

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Path2d};

use super::geometry::{EdgePath, wrap_label};
use super::state::RelationGraph;
use super::types::Point;

const ARROW_SIZE: f64 = 8.0;

/// Renders the complete graph to the canvas.
pub fn render(graph: &RelationGraph, ctx: &CanvasRenderingContext2d) {
	let transform = graph.transform();

	ctx.set_fill_style_str(&graph.theme().background.to_css());
	ctx.fill_rect(0.0, 0.0, graph.width, graph.height);

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	draw_edges(graph, ctx);
	draw_vertexes(graph, ctx);
	draw_link_draft(graph, ctx);

	ctx.restore();
}

fn draw_edges(graph: &RelationGraph, ctx: &CanvasRenderingContext2d) {
	let theme = graph.theme();
	let options = graph.options();
	let model = graph.model();

	for geometry in graph.frame() {
		let Some(edge) = model.edge_at(&geometry.edge_id) else {
			continue;
		};
		let color = theme
			.edge_color(edge.state, options.edge_color.as_deref())
			.to_css();

		if let Ok(path) = Path2d::new_with_path_string(&geometry.path.to_svg()) {
			ctx.set_stroke_style_str(&color);
			ctx.set_line_width(theme.edge_width(edge.state));
			ctx.stroke_with_path(&path);
		}
		draw_arrow(ctx, &geometry.path, options.r, &color);

		if let Some(label) = edge.label.as_deref().filter(|l| !l.is_empty()) {
			let (at, angle) = geometry.label_path().midpoint();
			ctx.save();
			let _ = ctx.translate(at.x, at.y);
			let _ = ctx.rotate(angle);
			ctx.set_font(&format!("{}px sans-serif", options.edge_font_size));
			ctx.set_text_align("center");
			ctx.set_fill_style_str(&theme.edge.label.to_css());
			let _ = ctx.fill_text(label, 0.0, -3.0);
			ctx.restore();
		}
	}
}

/// Draws an arrowhead where the path meets the target vertex's rim.
fn draw_arrow(ctx: &CanvasRenderingContext2d, path: &EdgePath, radius: f64, color: &str) {
	let end = path.end();
	let (toward, _) = path.midpoint();
	let approach = match path {
		EdgePath::Line { from, .. } => *from,
		EdgePath::Arc { .. } => toward,
		EdgePath::Cubic { c2, .. } => *c2,
	};
	let length = approach.distance(end);
	if length <= radius {
		return;
	}
	let (ux, uy) = ((end.x - approach.x) / length, (end.y - approach.y) / length);
	let tip = Point::new(end.x - ux * radius, end.y - uy * radius);
	let base = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);

	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(base.x + px, base.y + py);
	ctx.line_to(base.x - px, base.y - py);
	ctx.close_path();
	ctx.set_fill_style_str(color);
	ctx.fill();
}

fn draw_vertexes(graph: &RelationGraph, ctx: &CanvasRenderingContext2d) {
	let theme = graph.theme();
	let options = graph.options();
	let r = options.r;
	let line_height = options.vertex_font_size * 1.2;

	ctx.set_font(&format!("{}px sans-serif", options.vertex_font_size));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for vertex in graph.model().vertexes() {
		let Point { x, y } = vertex.position();
		let fill = theme.vertex_color(
			vertex.state,
			graph.type_ordinal(vertex.kind.as_deref()),
			options.vertex_color.as_deref(),
		);

		ctx.begin_path();
		let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&fill.to_css());
		ctx.fill();
		ctx.set_stroke_style_str(&theme.vertex.border.to_css());
		ctx.set_line_width(1.5);
		ctx.stroke();

		let lines = wrap_label(vertex.display_name(), r, options.vertex_font_size);
		let top = y - line_height * (lines.len() as f64 - 1.0) / 2.0;
		ctx.set_fill_style_str(&theme.vertex.label.to_css());
		for (i, line) in lines.iter().enumerate() {
			let _ = ctx.fill_text(line, x, top + line_height * i as f64);
		}
	}

	ctx.set_text_baseline("alphabetic");
}

fn draw_link_draft(graph: &RelationGraph, ctx: &CanvasRenderingContext2d) {
	let Some(draft) = graph.link_draft() else {
		return;
	};
	let Some(from) = graph.get_vertex_by_id(&draft.from).map(|v| v.position()) else {
		return;
	};

	let dash = js_sys::Array::new();
	dash.push(&JsValue::from_f64(6.0));
	dash.push(&JsValue::from_f64(4.0));
	let _ = ctx.set_line_dash(&dash);

	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.line_to(draft.cursor.x, draft.cursor.y);
	ctx.set_stroke_style_str(&graph.theme().edge.highlight.to_css());
	ctx.set_line_width(1.5);
	ctx.stroke();

	let _ = ctx.set_line_dash(&js_sys::Array::new());
}
