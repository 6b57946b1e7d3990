use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
    #[error("terminal configuration failed: {0}")]
    Terminal(String),
    #[error("robot fault: {0}")]
    Robot(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
