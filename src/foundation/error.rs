use std::path::PathBuf;

/// Convenience result type used across cocoaug.
pub type CocoAugResult<T> = Result<T, CocoAugError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum CocoAugError {
    /// Bad or missing catalog, directory, selection criteria or pipeline settings.
    ///
    /// Always raised before the catalog is mutated.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A catalog image has no file on disk. Recoverable during augmentation.
    #[error("source image not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A pixel transform could not run on the given buffer.
    #[error("transform error: {0}")]
    Transform(String),

    /// Errors when serializing or deserializing catalog data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CocoAugError {
    /// Build a [`CocoAugError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`CocoAugError::SourceNotFound`] value.
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound(path.into())
    }

    /// Build a [`CocoAugError::Transform`] value.
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    /// Build a [`CocoAugError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether an augmentation run may skip the current candidate and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceNotFound(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
