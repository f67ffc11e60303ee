//! Digital rain: weighted glyph alphabet and the scrolling glyph field.

mod alphabet;
mod field;

pub use alphabet::{AlphabetError, GlyphAlphabet, DEFAULT_GLYPHS};
pub use field::{RainField, RainMotion};
