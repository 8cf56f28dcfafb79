use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Lifecycle errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Vocabulary errors
    #[error("Unknown technology: {0}")]
    UnknownTechnology(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
