//! Visual theming for the relation graph.
//!
//! Colors and widths are pure functions of an element's state and the active
//! theme; nothing here reads or writes graph state.

use super::types::ElementState;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses `#RRGGBB`, `rgb()` or `rgba()` notation.
	pub fn parse(css: &str) -> Option<Color> {
		let css = css.trim();
		if let Some(hex) = css.strip_prefix('#') {
			if hex.len() != 6 {
				return None;
			}
			let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
			return Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
		}

		let body = css
			.strip_prefix("rgba(")
			.or_else(|| css.strip_prefix("rgb("))?
			.strip_suffix(')')?;
		let parts: Vec<&str> = body.split(',').map(str::trim).collect();
		let channel = |i: usize| parts.get(i)?.parse::<u8>().ok();
		let alpha = match parts.get(3) {
			Some(a) => a.parse().ok()?,
			None => 1.0,
		};
		Some(Color::rgba(channel(0)?, channel(1)?, channel(2)?, alpha))
	}
}

/// A curated color palette, indexed by vertex type ordinal.
#[derive(Clone, Debug)]
pub struct TypePalette {
	pub colors: Vec<Color>,
}

impl TypePalette {
	/// Muted slate blues and teals
	pub fn slate() -> Self {
		Self {
			colors: vec![
				Color::rgb(94, 129, 172),
				Color::rgb(163, 190, 140),
				Color::rgb(208, 135, 112),
				Color::rgb(180, 142, 173),
				Color::rgb(235, 203, 139),
				Color::rgb(136, 192, 208),
			],
		}
	}

	/// Warm earth tones
	pub fn earth() -> Self {
		Self {
			colors: vec![
				Color::rgb(180, 136, 100),
				Color::rgb(130, 150, 100),
				Color::rgb(170, 110, 90),
				Color::rgb(145, 120, 150),
				Color::rgb(200, 170, 110),
			],
		}
	}

	/// Blues and teals
	pub fn ocean() -> Self {
		Self {
			colors: vec![
				Color::rgb(70, 110, 140),
				Color::rgb(60, 150, 140),
				Color::rgb(110, 130, 180),
				Color::rgb(90, 170, 190),
				Color::rgb(130, 110, 160),
			],
		}
	}

	/// Cool teals and purples
	pub fn aurora() -> Self {
		Self {
			colors: vec![
				Color::rgb(100, 145, 135),
				Color::rgb(130, 120, 150),
				Color::rgb(120, 130, 160),
				Color::rgb(150, 170, 120),
				Color::rgb(170, 130, 150),
			],
		}
	}

	/// Soft pastels
	pub fn pastel() -> Self {
		Self {
			colors: vec![
				Color::rgb(200, 180, 190),
				Color::rgb(180, 195, 205),
				Color::rgb(190, 200, 180),
				Color::rgb(205, 195, 180),
				Color::rgb(185, 190, 200),
			],
		}
	}

	pub fn get(&self, index: usize) -> Color {
		self.colors[index % self.colors.len()]
	}
}

/// Vertex colors per display state.
#[derive(Clone, Debug)]
pub struct VertexStyle {
	pub highlight: Color,
	pub grey: Color,
	pub border: Color,
	pub label: Color,
}

/// Edge colors and widths per display state.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	pub color: Color,
	pub highlight: Color,
	pub grey: Color,
	pub width: f64,
	pub highlight_width: f64,
	pub label: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: Color,
	pub vertex: VertexStyle,
	pub edge: EdgeStyle,
	pub palette: TypePalette,
}

impl Theme {
	/// Names accepted by [`Theme::by_name`].
	pub const NAMES: [&'static str; 5] = ["default", "midnight", "ember", "deep_sea", "minimal"];

	pub fn by_name(name: &str) -> Option<Self> {
		match name {
			"default" => Some(Self::default_theme()),
			"midnight" => Some(Self::midnight()),
			"ember" => Some(Self::ember()),
			"deep_sea" => Some(Self::deep_sea()),
			"minimal" => Some(Self::minimal()),
			_ => None,
		}
	}

	/// Light canvas with saturated type colors (default)
	pub fn default_theme() -> Self {
		Self {
			name: "default",
			background: Color::rgb(250, 250, 252),
			vertex: VertexStyle {
				highlight: Color::rgb(230, 126, 34),
				grey: Color::rgba(190, 190, 196, 0.6),
				border: Color::rgb(255, 255, 255),
				label: Color::rgb(33, 37, 41),
			},
			edge: EdgeStyle {
				color: Color::rgba(120, 130, 145, 0.8),
				highlight: Color::rgb(230, 126, 34),
				grey: Color::rgba(200, 200, 205, 0.5),
				width: 1.0,
				highlight_width: 2.5,
				label: Color::rgb(80, 85, 95),
			},
			palette: TypePalette::slate(),
		}
	}

	/// Dark theme with aurora accents
	pub fn midnight() -> Self {
		Self {
			name: "midnight",
			background: Color::rgb(18, 20, 28),
			vertex: VertexStyle {
				highlight: Color::rgb(255, 214, 102),
				grey: Color::rgba(70, 75, 90, 0.6),
				border: Color::rgba(255, 255, 255, 0.3),
				label: Color::rgb(230, 232, 240),
			},
			edge: EdgeStyle {
				color: Color::rgba(100, 120, 150, 0.6),
				highlight: Color::rgb(255, 214, 102),
				grey: Color::rgba(60, 65, 80, 0.4),
				width: 1.0,
				highlight_width: 2.5,
				label: Color::rgb(170, 180, 200),
			},
			palette: TypePalette::aurora(),
		}
	}

	/// Warm earth tones
	pub fn ember() -> Self {
		Self {
			name: "ember",
			background: Color::rgb(28, 24, 22),
			vertex: VertexStyle {
				highlight: Color::rgb(255, 140, 60),
				grey: Color::rgba(80, 70, 65, 0.6),
				border: Color::rgba(255, 240, 220, 0.3),
				label: Color::rgb(240, 228, 215),
			},
			edge: EdgeStyle {
				color: Color::rgba(160, 130, 110, 0.6),
				highlight: Color::rgb(255, 140, 60),
				grey: Color::rgba(70, 60, 55, 0.4),
				width: 1.0,
				highlight_width: 2.5,
				label: Color::rgb(200, 180, 160),
			},
			palette: TypePalette::earth(),
		}
	}

	/// Deep blue theme
	pub fn deep_sea() -> Self {
		Self {
			name: "deep_sea",
			background: Color::rgb(15, 25, 35),
			vertex: VertexStyle {
				highlight: Color::rgb(120, 220, 232),
				grey: Color::rgba(50, 70, 85, 0.6),
				border: Color::rgba(200, 230, 255, 0.3),
				label: Color::rgb(220, 235, 245),
			},
			edge: EdgeStyle {
				color: Color::rgba(90, 130, 160, 0.6),
				highlight: Color::rgb(120, 220, 232),
				grey: Color::rgba(40, 60, 75, 0.4),
				width: 1.0,
				highlight_width: 2.5,
				label: Color::rgb(160, 190, 210),
			},
			palette: TypePalette::ocean(),
		}
	}

	/// Minimal, low-contrast theme
	pub fn minimal() -> Self {
		Self {
			name: "minimal",
			background: Color::rgb(255, 255, 255),
			vertex: VertexStyle {
				highlight: Color::rgb(60, 60, 60),
				grey: Color::rgba(220, 220, 220, 0.7),
				border: Color::rgba(0, 0, 0, 0.0),
				label: Color::rgb(40, 40, 40),
			},
			edge: EdgeStyle {
				color: Color::rgba(150, 150, 150, 0.7),
				highlight: Color::rgb(60, 60, 60),
				grey: Color::rgba(225, 225, 225, 0.6),
				width: 1.0,
				highlight_width: 2.0,
				label: Color::rgb(110, 110, 110),
			},
			palette: TypePalette::pastel(),
		}
	}

	/// Fill color of a vertex.
	///
	/// `override_css` replaces the palette color for the normal state only.
	pub fn vertex_color(&self, state: ElementState, type_ordinal: usize, override_css: Option<&str>) -> Color {
		match state {
			ElementState::Highlight => self.vertex.highlight,
			ElementState::Grey => self.vertex.grey,
			ElementState::Normal => override_css
				.and_then(Color::parse)
				.unwrap_or_else(|| self.palette.get(type_ordinal)),
		}
	}

	pub fn edge_color(&self, state: ElementState, override_css: Option<&str>) -> Color {
		match state {
			ElementState::Highlight => self.edge.highlight,
			ElementState::Grey => self.edge.grey,
			ElementState::Normal => override_css.and_then(Color::parse).unwrap_or(self.edge.color),
		}
	}

	pub fn edge_width(&self, state: ElementState) -> f64 {
		match state {
			ElementState::Highlight => self.edge.highlight_width,
			ElementState::Normal | ElementState::Grey => self.edge.width,
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::default_theme()
	}
}
