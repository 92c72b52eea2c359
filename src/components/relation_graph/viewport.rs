//! Viewport transform arithmetic: zoom about the container center, pan, and
//! screen-to-model inverse mapping.

use log::warn;
use serde::{Deserialize, Serialize};

use super::types::Point;

/// Pan and zoom transform applied to the entire graph view.
///
/// A model point `p` is drawn at `(p.x * k + x, p.y * k + y)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	pub fn invert(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}
}

/// Owns the current transform together with its zoom bounds and container center.
#[derive(Clone, Debug)]
pub struct ViewportController {
	transform: ViewTransform,
	scale_min: f64,
	scale_max: f64,
	center: Point,
}

impl ViewportController {
	pub fn new(scale_extent: [f64; 2], width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform::default(),
			scale_min: scale_extent[0],
			scale_max: scale_extent[1],
			center: Point::new(width / 2.0, height / 2.0),
		}
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn center(&self) -> Point {
		self.center
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.center = Point::new(width / 2.0, height / 2.0);
	}

	/// Zooms to `requested`, keeping the container center visually fixed.
	///
	/// The scale is clamped to the extent. Asking to go past a bound that has
	/// already been reached leaves the transform untouched. Returns whether the
	/// transform changed.
	pub fn zoom_to(&mut self, requested: f64) -> bool {
		let ViewTransform { x: x0, y: y0, k: k0 } = self.transform;
		if (requested > self.scale_max && k0 >= self.scale_max)
			|| (requested < self.scale_min && k0 <= self.scale_min)
		{
			return false;
		}

		let s = requested.clamp(self.scale_min, self.scale_max);
		let Point { x: cx, y: cy } = self.center;
		self.transform = ViewTransform {
			k: s,
			x: cx - ((cx - x0) / k0) * s,
			y: cy - ((cy - y0) / k0) * s,
		};
		true
	}

	/// Multiplies the current scale by `factor`.
	pub fn zoom_by(&mut self, factor: f64) -> bool {
		self.zoom_to(self.transform.k * factor)
	}

	/// Applies an arbitrary transform, e.g. a step of an animated transition.
	///
	/// A transform whose scale is not a positive finite number is ignored.
	pub fn transform_to(&mut self, transform: ViewTransform) -> bool {
		let ViewTransform { x, y, k } = transform;
		if !(k.is_finite() && k > 0.0 && x.is_finite() && y.is_finite()) {
			warn!("relation-graph: ignoring degenerate transform {transform:?}");
			return false;
		}
		self.transform = transform;
		true
	}

	/// Maps a screen point into model coordinates.
	pub fn invert(&self, screen: Point) -> Point {
		self.transform.invert(screen)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn controller() -> ViewportController {
		ViewportController::new([0.5, 2.0], 800.0, 600.0)
	}

	#[test]
	fn test_zoom_keeps_center_fixed() {
		let mut viewport = controller();
		let center = viewport.center();
		let before = viewport.invert(center);
		assert!(viewport.zoom_to(1.5));
		let after = viewport.invert(center);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);
		assert_eq!(viewport.transform().k, 1.5);
	}

	#[test]
	fn test_zoom_formula() {
		let mut viewport = controller();
		viewport.transform_to(ViewTransform {
			x: 100.0,
			y: 50.0,
			k: 1.0,
		});
		viewport.zoom_to(2.0);
		// x1 = 400 - (400 - 100) * 2, y1 = 300 - (300 - 50) * 2
		assert_eq!(
			viewport.transform(),
			ViewTransform {
				x: -200.0,
				y: -200.0,
				k: 2.0
			}
		);
	}

	#[test]
	fn test_out_of_range_request_clamps_then_noops() {
		let mut viewport = controller();
		assert!(viewport.zoom_to(10.0));
		let at_max = viewport.transform();
		assert_eq!(at_max.k, 2.0);
		assert!(!viewport.zoom_to(10.0));
		assert_eq!(viewport.transform(), at_max);

		assert!(viewport.zoom_to(0.01));
		assert_eq!(viewport.transform().k, 0.5);
		let at_min = viewport.transform();
		assert!(!viewport.zoom_to(0.2));
		assert_eq!(viewport.transform(), at_min);
	}

	#[test]
	fn test_degenerate_transform_is_ignored() {
		let mut viewport = controller();
		assert!(!viewport.transform_to(ViewTransform {
			x: 0.0,
			y: 0.0,
			k: 0.0
		}));
		assert!(!viewport.transform_to(ViewTransform {
			x: f64::NAN,
			y: 0.0,
			k: 1.0
		}));
		assert_eq!(viewport.transform(), ViewTransform::default());

		assert!(viewport.zoom_to(1.5));
		let t = viewport.transform();
		assert!(t.x.is_finite() && t.y.is_finite());
	}

	#[test]
	fn test_invert_round_trips_apply() {
		let transform = ViewTransform {
			x: 30.0,
			y: -12.0,
			k: 1.25,
		};
		let p = Point::new(7.0, 9.0);
		let back = transform.invert(transform.apply(p));
		assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
	}
}
