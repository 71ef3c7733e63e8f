use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Deferred not found: {0}")]
    DeferredNotFound(crate::core::DeferredId),

    #[error("Event loop exceeded {limit} ticks without draining")]
    TickLimitExceeded { limit: usize },

    #[error("Scenario {name} printed {actual:?}, expected {expected:?}")]
    ScenarioMismatch {
        name: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
