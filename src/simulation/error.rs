//! Error types for the green wave coordinator

use thiserror::Error;

/// The class of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Intersection,
    TrafficLight,
    Vehicle,
    RoadConnection,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Intersection => "intersection",
            EntityKind::TrafficLight => "traffic light",
            EntityKind::Vehicle => "vehicle",
            EntityKind::RoadConnection => "road connection",
        };
        f.write_str(name)
    }
}

/// Flat error classification, for callers that only care about the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DuplicateEntity,
    InvalidArgument,
    NotRunning,
    AlreadyRunning,
    ParsingError,
    InvalidFilePath,
    Unknown,
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Duplicate {kind}: {id}")]
    DuplicateEntity { kind: EntityKind, id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("External source not running: {0}")]
    NotRunning(String),

    #[error("External source already running")]
    AlreadyRunning,

    #[error("Parsing error: {0}")]
    Parsing(String),

    #[error("Invalid file path: {0}")]
    InvalidFilePath(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn duplicate(kind: EntityKind, id: impl Into<String>) -> Self {
        Error::DuplicateEntity {
            kind,
            id: id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::DuplicateEntity { .. } => ErrorCode::DuplicateEntity,
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::NotRunning(_) => ErrorCode::NotRunning,
            Error::AlreadyRunning => ErrorCode::AlreadyRunning,
            Error::Parsing(_) => ErrorCode::ParsingError,
            Error::InvalidFilePath(_) => ErrorCode::InvalidFilePath,
            Error::Unknown(_) => ErrorCode::Unknown,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
