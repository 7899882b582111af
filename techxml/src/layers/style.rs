use std::fmt::Display;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use super::pattern::{self, Pattern};

/// How the border of a layer's geometry is drawn.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Outline {
    /// No outline (`NOPAT`).
    None,
    /// A solid outline (`PAT_S`).
    Solid,
    /// Any other outline style understood by the layout tool, e.g. `PAT_T2`.
    Named(ArcStr),
}

impl Display for Outline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NOPAT"),
            Self::Solid => write!(f, "PAT_S"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

impl From<bool> for Outline {
    fn from(value: bool) -> Self {
        if value {
            Self::Solid
        } else {
            Self::None
        }
    }
}

/// An opaque 24-bit color.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the color with each channel halved, rounding down.
    pub const fn halved(self) -> Self {
        Self::new(self.r / 2, self.g / 2, self.b / 2)
    }
}

/// The default rendering of a layer: fill pattern, border and color.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RenderingStyle {
    pub pattern: Pattern,
    pub outline: Outline,
    pub color: Color,
}

impl Default for RenderingStyle {
    /// Sparse gray, not outlined.
    fn default() -> Self {
        Self::new(pattern::SPARSE, Outline::None, Color::new(100, 100, 100))
    }
}

impl RenderingStyle {
    pub fn new(pattern: Pattern, outline: impl Into<Outline>, color: Color) -> Self {
        Self {
            pattern,
            outline: outline.into(),
            color,
        }
    }

    /// A style with no outline.
    #[inline]
    pub fn filled(pattern: Pattern, r: u8, g: u8, b: u8) -> Self {
        Self::new(pattern, Outline::None, Color::new(r, g, b))
    }

    /// A style with a solid outline.
    #[inline]
    pub fn outlined(pattern: Pattern, r: u8, g: u8, b: u8) -> Self {
        Self::new(pattern, Outline::Solid, Color::new(r, g, b))
    }

    /// The style given to the dummy-fill child of a layer drawn in `self`.
    pub fn dummy_fill(&self) -> Self {
        Self::new(pattern::VERY_SPARSE, Outline::Solid, self.color.halved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_names() {
        assert_eq!(Outline::from(true).to_string(), "PAT_S");
        assert_eq!(Outline::from(false).to_string(), "NOPAT");
        assert_eq!(Outline::Named(arcstr::literal!("PAT_T2")).to_string(), "PAT_T2");
    }

    #[test]
    fn dummy_fill_halves_color() {
        let style = RenderingStyle::filled(pattern::SOLID, 72, 189, 178);
        let dummy = style.dummy_fill();
        assert_eq!(dummy.color, Color::new(36, 94, 89));
        assert_eq!(dummy.outline, Outline::Solid);
        assert_eq!(dummy.pattern, pattern::VERY_SPARSE);
    }
}
