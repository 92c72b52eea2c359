//! Interactive edge creation: press on a vertex, drag, release on another.

use super::types::Point;
use super::viewport::ViewportController;

/// A provisional edge following the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkDraft {
	pub from: String,
	/// Pointer position in model coordinates.
	pub cursor: Point,
}

/// Callback receiving `(from_id, to_id)` when a link is committed.
pub type LinkCallback = Box<dyn FnMut(&str, &str)>;

/// Holds the bound callback and any draft in progress.
#[derive(Default)]
pub struct Linker {
	callback: Option<LinkCallback>,
	draft: Option<LinkDraft>,
}

impl Linker {
	pub fn bind(&mut self, callback: impl FnMut(&str, &str) + 'static) {
		self.callback = Some(Box::new(callback));
	}

	pub fn is_bound(&self) -> bool {
		self.callback.is_some()
	}

	pub fn draft(&self) -> Option<&LinkDraft> {
		self.draft.as_ref()
	}

	/// Starts a draft from `vertex_id`; ignored when no callback is bound.
	pub fn begin(&mut self, vertex_id: &str, at: Point) -> bool {
		if !self.is_bound() {
			return false;
		}
		self.draft = Some(LinkDraft {
			from: vertex_id.to_string(),
			cursor: at,
		});
		true
	}

	/// Moves the draft end to the pointer, mapped into model coordinates.
	pub fn drag(&mut self, screen: Point, viewport: &ViewportController) {
		if let Some(draft) = self.draft.as_mut() {
			draft.cursor = viewport.invert(screen);
		}
	}

	/// Ends the draft over `target`.
	///
	/// Releasing on a different vertex returns the proposed `(from, to)` pair;
	/// the same vertex or empty canvas cancels. The callback is not invoked
	/// until the owner reports the edge as [`committed`](Self::committed).
	pub fn release(&mut self, target: Option<&str>) -> Option<(String, String)> {
		let draft = self.draft.take()?;
		let to = target.filter(|t| *t != draft.from)?;
		Some((draft.from, to.to_string()))
	}

	/// Notifies the bound callback of an edge that was added to the model.
	pub fn committed(&mut self, from: &str, to: &str) {
		if let Some(callback) = self.callback.as_mut() {
			callback(from, to);
		}
	}

	pub fn cancel(&mut self) {
		self.draft = None;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	fn bound() -> (Linker, Rc<RefCell<Vec<(String, String)>>>) {
		let calls = Rc::new(RefCell::new(Vec::new()));
		let seen = calls.clone();
		let mut linker = Linker::default();
		linker.bind(move |from, to| seen.borrow_mut().push((from.to_string(), to.to_string())));
		(linker, calls)
	}

	#[test]
	fn test_release_on_other_vertex_proposes_pair() {
		let (mut linker, calls) = bound();
		assert!(linker.begin("A", Point::new(0.0, 0.0)));
		let proposed = linker.release(Some("B"));
		assert_eq!(proposed, Some(("A".to_string(), "B".to_string())));
		assert!(calls.borrow().is_empty());
		assert!(linker.draft().is_none());

		linker.committed("A", "B");
		assert_eq!(*calls.borrow(), vec![("A".to_string(), "B".to_string())]);
	}

	#[test]
	fn test_release_on_same_vertex_or_canvas_cancels() {
		let (mut linker, calls) = bound();
		linker.begin("A", Point::new(0.0, 0.0));
		assert_eq!(linker.release(Some("A")), None);
		linker.begin("A", Point::new(0.0, 0.0));
		assert_eq!(linker.release(None), None);
		assert!(calls.borrow().is_empty());
	}

	#[test]
	fn test_drag_follows_inverse_transformed_pointer() {
		let (mut linker, _) = bound();
		let mut viewport = ViewportController::new([0.5, 2.0], 800.0, 600.0);
		viewport.zoom_to(2.0);
		linker.begin("A", Point::new(0.0, 0.0));
		linker.drag(Point::new(400.0, 300.0), &viewport);
		assert_eq!(linker.draft().unwrap().cursor, Point::new(400.0, 300.0));
		linker.drag(Point::new(500.0, 300.0), &viewport);
		assert_eq!(linker.draft().unwrap().cursor, Point::new(450.0, 300.0));
	}

	#[test]
	fn test_unbound_linker_never_drafts() {
		let mut linker = Linker::default();
		assert!(!linker.begin("A", Point::new(0.0, 0.0)));
		assert_eq!(linker.release(Some("B")), None);
	}
}
