use thiserror::Error;

/// Error type shared by the model layer and the config/IO layer.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Unknown category {label} at observation {index}")]
    UnknownCategory { label: String, index: usize },
    #[error("Duplicate category {label}")]
    DuplicateCategory { label: String },
    #[error("Invalid alpha {value} at category {index}: must be finite and > 0")]
    InvalidAlpha { index: usize, value: f64 },
    #[error("Invalid fill value {value}: must be finite and >= 0, and > 0 for a cheat model")]
    InvalidFill { value: f64 },
    #[error("Invalid threshold {value}: must be finite and > 0")]
    InvalidThreshold { value: f64 },
    #[error("Shape error: {0}")]
    Shape(String),
    #[error("Unsupported in this detector mode: {0}")]
    UnsupportedMode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config error: {0}")]
    Config(String),
}
