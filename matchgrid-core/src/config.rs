//! Engine configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::error::ConfigError;
use crate::solver::is_playable;
use crate::symbol::{SymbolSet, DEFAULT_SYMBOLS, MAX_SYMBOLS, MIN_SYMBOLS};

/// Delays between cascade phases, in engine-clock milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Shown-swapped time before a no-match swap is undone
    pub revert_ms: u64,
    /// Time matched pieces stay visible before removal
    pub remove_ms: u64,
    /// Time for refilled pieces to land before the board is re-checked
    pub refill_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            revert_ms: 300,
            remove_ms: 300,
            refill_ms: 300,
        }
    }
}

impl Timings {
    /// All delays zero: every phase fires on the next tick
    pub fn instant() -> Self {
        Self {
            revert_ms: 0,
            remove_ms: 0,
            refill_ms: 0,
        }
    }
}

/// Board shape, symbol set, timings and generation bounds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    /// Number of distinct piece types
    pub symbols: u8,
    pub timings: Timings,
    /// Shuffles tried at initialization to clear leftover runs
    pub max_initial_shuffles: usize,
    /// Permutations tried before a reshuffle rebuilds the layout
    pub max_reshuffle_attempts: usize,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            symbols: DEFAULT_SYMBOLS,
            timings: Timings::default(),
            max_initial_shuffles: 10,
            max_reshuffle_attempts: 16,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn symbol_set(&self) -> SymbolSet {
        SymbolSet::new(self.symbols)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols < MIN_SYMBOLS {
            return Err(ConfigError::TooFewSymbols {
                min: MIN_SYMBOLS,
                got: self.symbols,
            });
        }
        if self.symbols > MAX_SYMBOLS {
            return Err(ConfigError::TooManySymbols {
                max: MAX_SYMBOLS,
                got: self.symbols,
            });
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !is_playable(self.rows, self.cols) {
            return Err(ConfigError::Unplayable {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_dimensions(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_symbols(mut self, symbols: u8) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Load from JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
