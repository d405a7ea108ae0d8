use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopoGenError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    #[error("failed to parse {source_name}: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TopoGenError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TopoGenError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn parse(source_name: impl Into<String>, message: impl ToString) -> Self {
        TopoGenError::ParseError {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

macro_rules! io_err {
    ($path:expr, $err:expr) => {
        $crate::errors::TopoGenError::Io {
            path: $path.to_path_buf(),
            source: $err,
        }
    };
}

pub(crate) use io_err;

pub type Result<T> = std::result::Result<T, TopoGenError>;
