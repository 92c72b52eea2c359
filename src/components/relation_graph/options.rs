//! Graph configuration with explicit defaults, validated once at construction.

use serde::Deserialize;

use super::error::{GraphError, Result};

/// Recognized graph options.
///
/// Deserializes from the camelCase keys a host page supplies; every field
/// falls back to its default when absent.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphOptions {
	/// Vertex radius in model units.
	pub r: f64,
	/// Edge rest length.
	pub distance: f64,
	/// Many-body strength; negative values repel.
	pub charge_strength: f64,
	/// Fraction of remaining energy shed per tick.
	pub alpha_decay: f64,
	/// Overrides the theme color of vertices in the normal state.
	pub vertex_color: Option<String>,
	/// Overrides the theme color of edges in the normal state.
	pub edge_color: Option<String>,
	pub vertex_font_size: f64,
	pub edge_font_size: f64,
	pub icon_path: Option<String>,
	pub scalable: bool,
	/// Allowed zoom range as `[min, max]`.
	pub scale_extent: [f64; 2],
	pub dragable: bool,
	/// Explicit canvas width; the container size is used when unset.
	pub width: Option<f64>,
	pub height: Option<f64>,
	/// Name of the initial theme.
	pub theme: String,
}

impl Default for GraphOptions {
	fn default() -> Self {
		Self {
			r: 20.0,
			distance: 150.0,
			charge_strength: -500.0,
			alpha_decay: 0.07,
			vertex_color: None,
			edge_color: None,
			vertex_font_size: 12.0,
			edge_font_size: 10.0,
			icon_path: None,
			scalable: true,
			scale_extent: [0.5, 2.0],
			dragable: true,
			width: None,
			height: None,
			theme: "default".to_string(),
		}
	}
}

impl GraphOptions {
	/// Parses options from JSON and validates them.
	pub fn from_json(json: &str) -> Result<Self> {
		let options: GraphOptions =
			serde_json::from_str(json).map_err(|e| GraphError::InvalidOption(e.to_string()))?;
		options.validate()?;
		Ok(options)
	}

	pub fn validate(&self) -> Result<()> {
		let positive = |name: &str, value: f64| {
			if value.is_finite() && value > 0.0 {
				Ok(())
			} else {
				Err(GraphError::InvalidOption(format!(
					"{name} must be positive, got {value}"
				)))
			}
		};

		positive("r", self.r)?;
		positive("distance", self.distance)?;
		positive("vertexFontSize", self.vertex_font_size)?;
		positive("edgeFontSize", self.edge_font_size)?;
		if let Some(width) = self.width {
			positive("width", width)?;
		}
		if let Some(height) = self.height {
			positive("height", height)?;
		}

		if !(self.alpha_decay > 0.0 && self.alpha_decay <= 1.0) {
			return Err(GraphError::InvalidOption(format!(
				"alphaDecay must be in (0, 1], got {}",
				self.alpha_decay
			)));
		}
		if !self.charge_strength.is_finite() {
			return Err(GraphError::InvalidOption(
				"chargeStrength must be finite".to_string(),
			));
		}

		let [min, max] = self.scale_extent;
		if !(min > 0.0 && min <= max && max.is_finite()) {
			return Err(GraphError::InvalidOption(format!(
				"scaleExtent must satisfy 0 < min <= max, got [{min}, {max}]"
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let options = GraphOptions::default();
		assert!(options.validate().is_ok());
		assert_eq!(options.r, 20.0);
		assert_eq!(options.scale_extent, [0.5, 2.0]);
	}

	#[test]
	fn test_partial_json_keeps_defaults() {
		let options =
			GraphOptions::from_json(r#"{"chargeStrength": -300, "scaleExtent": [0.25, 4]}"#)
				.unwrap();
		assert_eq!(options.charge_strength, -300.0);
		assert_eq!(options.scale_extent, [0.25, 4.0]);
		assert_eq!(options.distance, 150.0);
		assert!(options.dragable);
	}

	#[test]
	fn test_inverted_scale_extent_is_rejected() {
		let result = GraphOptions::from_json(r#"{"scaleExtent": [2, 1]}"#);
		assert!(matches!(result, Err(GraphError::InvalidOption(_))));
	}

	#[test]
	fn test_zero_alpha_decay_is_rejected() {
		let options = GraphOptions {
			alpha_decay: 0.0,
			..GraphOptions::default()
		};
		assert!(options.validate().is_err());
	}
}
