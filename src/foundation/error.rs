pub type NeuroframeResult<T> = Result<T, NeuroframeError>;

/// Error taxonomy for the compositing pipeline.
///
/// Every failure is raised synchronously at the point of detection; there is
/// no retry or partial-result path.
#[derive(thiserror::Error, Debug)]
pub enum NeuroframeError {
    /// Input array has the wrong rank or inconsistent dimensions.
    #[error("shape error: {0}")]
    Shape(String),

    /// Degenerate or out-of-domain numeric input (empty axis, non-finite
    /// sample, alpha outside [0,1], ...).
    #[error("value error: {0}")]
    Value(String),

    /// An operation was invoked before its precondition (loaded volume,
    /// loaded background) was met.
    #[error("state error: {0}")]
    State(String),

    /// Frame index outside `0..time_extent`.
    #[error("index error: {0}")]
    Index(String),

    /// A resource (background file, encoder binary) was unreadable or in an
    /// unsupported format.
    #[error("resource error: {0}")]
    Resource(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NeuroframeError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }
}
