//! Leptos component hosting a relation graph on a canvas.
//!
//! The component owns a [`RelationGraph`], sizes the canvas, and maps mouse
//! input onto its operations: dragging vertices, panning the background,
//! wheel zoom, click highlighting, shift-drag edge creation and right clicks.
//! An animation loop runs via `requestAnimationFrame`, ticking the layout and
//! repainting every frame.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::options::GraphOptions;
use super::render;
use super::state::{ClickTarget, RelationGraph};
use super::types::{GraphData, Point};

/// Pointer travel below which a press and release count as a click.
const CLICK_SLOP: f64 = 4.0;

/// Which gesture the current press started.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Drag,
	Pan,
	Link,
}

struct GraphContext {
	graph: RelationGraph,
	gesture: Gesture,
	press: Point,
	moved: bool,
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders an interactive relation graph on a canvas element.
///
/// The component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and follow window resizes.
/// `width`/`height` props or the matching options override both.
#[component]
pub fn RelationGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(default = GraphOptions::default())] options: GraphOptions,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = match window_size(&window).filter(|_| fullscreen) {
			Some(size) => size,
			None => (
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			),
		};

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("relation-graph: canvas has no 2d context");
			return;
		};

		let mut graph = match RelationGraph::new(data.get(), options.clone(), w, h) {
			Ok(graph) => graph,
			Err(e) => {
				warn!("relation-graph: failed to build graph: {e}");
				return;
			}
		};
		canvas.set_width(graph.width as u32);
		canvas.set_height(graph.height as u32);
		graph.bind_line_with(|from, to| info!("relation-graph: linked {from} -> {to}"));
		graph.bind_right_click(|target, at| match target {
			ClickTarget::Vertex(id) => info!("relation-graph: right click on {id}"),
			ClickTarget::Canvas => info!("relation-graph: right click at ({}, {})", at.x, at.y),
		});

		*context_init.borrow_mut() = Some(GraphContext {
			graph,
			gesture: Gesture::Idle,
			press: Point::default(),
			moved: false,
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.graph.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				if c.graph.is_animating() {
					c.graph.tick(0.016);
				}
				render::render(&c.graph, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(at) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			c.press = at;
			c.moved = false;
			c.gesture = match c.graph.vertex_at_position(at) {
				Some(_) if ev.shift_key() && c.graph.link_begin(at) => Gesture::Link,
				Some(id) if c.graph.drag_start(&id) => Gesture::Drag,
				_ => {
					c.graph.pan_start(at);
					Gesture::Pan
				}
			};
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(at) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			if c.gesture == Gesture::Idle {
				return;
			}
			c.moved |= at.distance(c.press) > CLICK_SLOP;
			match c.gesture {
				Gesture::Drag => c.graph.drag_move(at),
				Gesture::Pan => c.graph.pan_move(at),
				Gesture::Link => c.graph.link_drag(at),
				Gesture::Idle => {}
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(at) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			match std::mem::take(&mut c.gesture) {
				Gesture::Link => {
					c.graph.link_release(at);
				}
				Gesture::Drag => c.graph.drag_end(),
				Gesture::Pan => c.graph.pan_end(),
				Gesture::Idle => return,
			}
			if !c.moved {
				c.graph.click(at);
			}
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			match std::mem::take(&mut c.gesture) {
				Gesture::Link => c.graph.link_cancel(),
				Gesture::Drag => c.graph.drag_end(),
				Gesture::Pan => c.graph.pan_end(),
				Gesture::Idle => {}
			}
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			c.graph.wheel(ev.delta_y());
		}
	};

	let context_cm = context.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(at) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_cm.borrow_mut() {
			c.graph.right_click(at);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="relation-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:contextmenu=on_contextmenu
			style="display: block; cursor: grab;"
		/>
	}
}
