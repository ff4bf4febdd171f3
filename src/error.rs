use thiserror::Error;

/// Main error type for the Keyframe-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Path data error: {0}")]
    Path(#[from] PathError),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Path document errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Failed to parse path data: {reason}")]
    Parse { reason: String },

    #[error("Invalid path data: {reason}")]
    Invalid { reason: String },

    #[error("Failed to encode path data: {reason}")]
    Encode { reason: String },
}

/// Raster loading and saving errors
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Failed to load image: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save image: {path} - {reason}")]
    SaveFailed { path: String, reason: String },
}

/// Composition-specific errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("No foreground supplied: provide a single foreground image or a batch of foreground images")]
    MissingForeground,

    #[error("Invalid composition parameters: {details}")]
    InvalidParameters { details: String },

    #[error("Output generation failed: {reason}")]
    OutputFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Raster(RasterError::LoadFailed { .. }) => true,
            // A caller may substitute an empty document and keep rendering
            Self::Path(PathError::Parse { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Raster(RasterError::LoadFailed { path }) => {
                format!("Could not load image '{}'. Please check the file exists and is a PNG or JPEG.", path)
            }
            Self::Path(PathError::Parse { reason }) => {
                format!("Path data could not be read ({}). Expected JSON or 'frame:x,y;x,y|...'.", reason)
            }
            Self::Composition(CompositionError::MissingForeground) => {
                "Nothing to animate: pass --foreground or at least one --foreground-batch image.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_recoverable() {
        let err: CompositorError = PathError::Parse { reason: "bad frame".into() }.into();
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("bad frame"));
    }

    #[test]
    fn test_missing_foreground_is_fatal() {
        let err: CompositorError = CompositionError::MissingForeground.into();
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("--foreground"));
    }
}
