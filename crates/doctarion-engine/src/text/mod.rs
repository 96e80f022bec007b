//! Graphemes, text runs and sparse text styling.

pub mod grapheme;
pub mod strip;
pub mod style;

pub use grapheme::{FancyGrapheme, FancyText, Grapheme, Text};
pub use strip::{TextStyleStrip, TextStyleStripEntry};
pub use style::{TextStyle, TextStyleModifier, TextStylePurpose};
