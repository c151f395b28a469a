//! Error Types for the Classroom Tools

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClassroomError>;

#[derive(Error, Debug)]
pub enum ClassroomError {
    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Calendar authentication failed: {0}")]
    Auth(String),

    #[error("No matching event found with name '{0}'")]
    EventNotFound(String),

    #[error("Invalid time '{0}'")]
    InvalidTime(String),

    #[error("No student found with ID {0}")]
    StudentNotFound(u32),

    #[error("Roster error: {0}")]
    Roster(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
