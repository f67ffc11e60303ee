//! Glyph frame types handed to the display.

/// RGB color for a character cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl CellColor {
    pub const BLACK: CellColor = CellColor { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `keep / 255`, rounding down.
    pub fn fade(self, keep: u8) -> Self {
        let f = |c: u8| ((c as u16 * keep as u16) / 255) as u8;
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    /// Per-channel maximum.
    pub fn max(self, other: Self) -> Self {
        Self {
            r: self.r.max(other.r),
            g: self.g.max(other.g),
            b: self.b.max(other.b),
        }
    }
}

/// Fully composed grid of glyphs and colors, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphFrame {
    /// Character data for the frame (row-major order)
    pub glyphs: Vec<char>,
    /// Color of each glyph (same length as glyphs)
    pub colors: Vec<CellColor>,
    /// Width in cells
    pub cols: u16,
    /// Height in cells
    pub rows: u16,
}

impl Default for GlyphFrame {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl GlyphFrame {
    /// Blank frame: spaces on black.
    pub fn new(cols: u16, rows: u16) -> Self {
        let size = (cols as usize) * (rows as usize);
        Self {
            glyphs: vec![' '; size],
            colors: vec![CellColor::BLACK; size],
            cols,
            rows,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyph(&self, row: u16, col: u16) -> char {
        self.glyphs[row as usize * self.cols as usize + col as usize]
    }

    pub fn color(&self, row: u16, col: u16) -> CellColor {
        self.colors[row as usize * self.cols as usize + col as usize]
    }

    /// Glyphs only, rows joined by newlines.
    pub fn to_string_display(&self) -> String {
        if self.cols == 0 || self.rows == 0 {
            return String::new();
        }

        self.glyphs
            .chunks(self.cols as usize)
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
