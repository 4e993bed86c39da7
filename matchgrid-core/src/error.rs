//! Error types

/// Reasons an engine configuration is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least {min} symbols are required, got {got}")]
    TooFewSymbols { min: u8, got: u8 },

    #[error("at most {max} symbols are supported, got {got}")]
    TooManySymbols { max: u8, got: u8 },

    #[error("board needs at least one row and one column, got {rows}x{cols}")]
    EmptyDimension { rows: usize, cols: usize },

    #[error("no swap can ever line up three on a {rows}x{cols} board")]
    Unplayable { rows: usize, cols: usize },
}
