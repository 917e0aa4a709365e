//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading or writing a scene file
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Parse error in {path}: {message}")]
    ParseError { path: String, message: String },
    
    #[error("could not write '{path}': {source}")]
    WriteError { path: String, source: std::io::Error },
    
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    pub fn parse(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        IoError::ParseError {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn write(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        IoError::WriteError {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<IoError> for msgview_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(e) => msgview_core::Error::Io(e),
            IoError::WriteError { path, source } => msgview_core::Error::Io(std::io::Error::new(
                source.kind(),
                format!("could not write '{}': {}", path, source),
            )),
            parse @ IoError::ParseError { .. } => msgview_core::Error::InvalidData(parse.to_string()),
        }
    }
}
