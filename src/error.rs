//! Error taxonomy for adjspace.
//!
//! Precondition violations (mismatched array lengths, out-of-range node
//! indices, probabilities outside `[0, 1]`) fail fast with a descriptive
//! error; they are never silently coerced. Numerical edge cases such as
//! zero degrees or empty softmax groups are handled by the kernels
//! themselves (zero-substitution) and never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("length mismatch: {name} has {got} entries, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("node index {index} out of range for {num_nodes} nodes")]
    IndexOutOfRange { index: usize, num_nodes: usize },

    #[error("probability {value} outside [0, 1]")]
    InvalidProbability { value: f64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
