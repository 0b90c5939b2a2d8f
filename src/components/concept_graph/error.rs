use thiserror::Error;

/// Local, recoverable failures. Nothing in the graph core is fatal: callers
/// log these and carry on with the previous state.
#[derive(Debug, Error)]
pub enum GraphError {
	#[error("malformed update event: {0}")]
	MalformedEvent(String),

	#[error("unknown node `{0}`")]
	UnknownNode(String),

	#[error("snapshot serialization failed: {0}")]
	Snapshot(#[from] serde_json::Error),

	#[error("invalid configuration: {0}")]
	Config(String),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
