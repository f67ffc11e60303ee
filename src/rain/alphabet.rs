//! Weighted glyph alphabet for the rain.

use std::fmt;
use std::str::FromStr;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Default glyph table: binary digits dominate, everything else is rare.
///
/// `·` stands in for a full-width middle dot, which would take two
/// terminal cells.
pub const DEFAULT_GLYPHS: &[(char, u32)] = &[
    ('1', 22),
    ('0', 19),
    ('2', 1),
    ('3', 1),
    ('4', 1),
    ('5', 1),
    ('6', 1),
    ('7', 1),
    ('8', 1),
    ('9', 1),
    ('Z', 1),
    (':', 1),
    ('·', 1),
    ('.', 1),
    ('=', 1),
    ('*', 1),
    ('+', 1),
    ('-', 1),
    ('<', 1),
    ('>', 1),
];

/// Errors building or parsing an alphabet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlphabetError {
    #[error("Alphabet must contain at least one glyph")]
    Empty,

    #[error("Alphabet weights must not all be zero")]
    ZeroTotalWeight,

    #[error("Glyph '{0}' appears more than once")]
    DuplicateGlyph(char),

    #[error("Invalid alphabet entry '{0}'. Expected format: GLYPH=WEIGHT (e.g., 1=22)")]
    InvalidEntry(String),

    #[error("Invalid weight '{weight}' for glyph '{glyph}'. Must be a non-negative integer")]
    InvalidWeight { glyph: char, weight: String },

    #[error("Alphabet weights add up to more than {}", u32::MAX)]
    WeightOverflow,
}

/// A discrete distribution over glyphs.
#[derive(Debug, Clone)]
pub struct GlyphAlphabet {
    entries: Vec<(char, u32)>,
    total: u64,
    index: WeightedIndex<u32>,
}

impl GlyphAlphabet {
    pub fn new(entries: Vec<(char, u32)>) -> Result<Self, AlphabetError> {
        if entries.is_empty() {
            return Err(AlphabetError::Empty);
        }
        for (i, &(glyph, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|&(g, _)| g == glyph) {
                return Err(AlphabetError::DuplicateGlyph(glyph));
            }
        }
        // WeightedIndex accumulates in the weight type.
        let total = entries
            .iter()
            .try_fold(0u32, |acc, &(_, w)| acc.checked_add(w))
            .ok_or(AlphabetError::WeightOverflow)? as u64;
        if total == 0 {
            return Err(AlphabetError::ZeroTotalWeight);
        }
        let index = WeightedIndex::new(entries.iter().map(|&(_, w)| w))
            .map_err(|_| AlphabetError::ZeroTotalWeight)?;

        Ok(Self {
            entries,
            total,
            index,
        })
    }

    /// Parse `GLYPH=WEIGHT,GLYPH=WEIGHT,...`.
    ///
    /// The last `=` in an entry separates glyph from weight, so `==1` gives
    /// `=` a weight of 1. A comma cannot be used as a glyph.
    pub fn parse(s: &str) -> Result<Self, AlphabetError> {
        let mut entries = Vec::new();
        for raw in s.split(',') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }
            let (glyph_part, weight_part) = entry
                .rsplit_once('=')
                .ok_or_else(|| AlphabetError::InvalidEntry(entry.to_string()))?;

            let mut chars = glyph_part.chars();
            let glyph = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(AlphabetError::InvalidEntry(entry.to_string())),
            };
            let weight = weight_part
                .trim()
                .parse::<u32>()
                .map_err(|_| AlphabetError::InvalidWeight {
                    glyph,
                    weight: weight_part.to_string(),
                })?;
            entries.push((glyph, weight));
        }
        Self::new(entries)
    }

    /// Draw one glyph.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.entries[self.index.sample(rng)].0
    }

    /// Selection probability of `glyph` (0.0 if absent).
    pub fn probability(&self, glyph: char) -> f64 {
        self.entries
            .iter()
            .find(|&&(g, _)| g == glyph)
            .map(|&(_, w)| w as f64 / self.total as f64)
            .unwrap_or(0.0)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.iter().map(|&(g, _)| g)
    }

    pub fn entries(&self) -> &[(char, u32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GlyphAlphabet {
    fn default() -> Self {
        let entries = DEFAULT_GLYPHS.to_vec();
        let total = entries.iter().map(|&(_, w)| w as u64).sum();
        let index = match WeightedIndex::new(entries.iter().map(|&(_, w)| w)) {
            Ok(index) => index,
            Err(e) => unreachable!("default glyph weights are valid: {}", e),
        };
        Self {
            entries,
            total,
            index,
        }
    }
}

impl FromStr for GlyphAlphabet {
    type Err = AlphabetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for GlyphAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (glyph, weight)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", glyph, weight)?;
        }
        Ok(())
    }
}
