use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TeleopError {
    #[error("robot fault: {0}")]
    Robot(String),
    #[error("terminal configuration failed: {0}")]
    Terminal(String),
    #[error("input error: {0}")]
    Input(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing robot")]
    MissingRobot,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
