/// Errors produced while building or rendering check results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid service state: {0}")]
    InvalidState(String),
    #[error("could not parse threshold '{spec}': {reason}")]
    InvalidThreshold { spec: String, reason: String },
    #[error("perfdata value for '{label}' is not representable: {value}")]
    UnrepresentableValue { label: String, value: f64 },
    #[error("perfdata label is empty")]
    EmptyLabel,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error serializing check result: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
