//! Error types surfaced synchronously to callers of the graph operations.

use thiserror::Error;

/// Errors raised by loading, filtering, and option validation.
///
/// Every failing operation leaves the graph in its pre-call state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
	#[error("schema error: {0}")]
	Schema(String),

	#[error("predicate is not invocable: {0}")]
	PredicateType(String),

	#[error("invalid option: {0}")]
	InvalidOption(String),
}

impl From<serde_json::Error> for GraphError {
	fn from(err: serde_json::Error) -> Self {
		GraphError::Schema(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, GraphError>;
