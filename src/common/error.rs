use std::{error::Error, fmt::Display};

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// The configuration cannot describe a valid policy.
    InvalidConfig(String),
    /// Host data does not have the shape the policy was built for.
    ShapeMismatch { what: String, expected: usize, got: usize },
    /// Tensor data could not be read back to the host.
    Data(String),
}

impl Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::InvalidConfig(msg) => write!(f, "invalid policy config: {msg}"),
            PolicyError::ShapeMismatch { what, expected, got } => {
                write!(f, "{what}: expected {expected}, got {got}")
            }
            PolicyError::Data(msg) => write!(f, "tensor data error: {msg}"),
        }
    }
}

impl Error for PolicyError {}
