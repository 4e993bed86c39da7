//! Symbol definitions

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fewest symbols a board may use (rejection sampling needs a third choice)
pub const MIN_SYMBOLS: u8 = 3;

/// Most symbols a board may use (one letter each in text snapshots)
pub const MAX_SYMBOLS: u8 = 26;

/// Symbol count of the reference board
pub const DEFAULT_SYMBOLS: u8 = 6;

/// A piece type, indexed from 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub u8);

impl Symbol {
    /// Letter used by text snapshots (`A` for symbol 0)
    pub fn letter(self) -> char {
        (b'A' + self.0 % MAX_SYMBOLS) as char
    }

    /// Parse a snapshot letter back into a symbol
    pub fn from_letter(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Some(Symbol(upper as u8 - b'A'))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The finite set of symbols a board draws from: `Symbol(0)..Symbol(count)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    count: u8,
}

impl SymbolSet {
    pub const fn new(count: u8) -> Self {
        Self { count }
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        symbol.0 < self.count
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> {
        (0..self.count).map(Symbol)
    }

    /// Uniform pick over the whole set
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Symbol {
        Symbol(rng.gen_range(0..self.count))
    }

    /// Uniform pick over the symbols not in `excluded`.
    ///
    /// Returns `None` only when every symbol is excluded.
    pub fn random_excluding<R: Rng + ?Sized>(&self, rng: &mut R, excluded: &[Symbol]) -> Option<Symbol> {
        let allowed: Vec<Symbol> = self.iter().filter(|s| !excluded.contains(s)).collect();
        if allowed.is_empty() {
            return None;
        }
        Some(allowed[rng.gen_range(0..allowed.len())])
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOLS)
    }
}
