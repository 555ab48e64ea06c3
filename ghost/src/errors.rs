//! Error types shared across the collector.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

pub type GhostResult<T> = Result<T, GhostError>;

#[derive(Debug, Error)]
pub enum GhostError {
    /// Bare I/O failure, converted with `?`.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// I/O failure on a specific archive path.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A service-manager property could not be read or converted.
    #[error("property error: {0}")]
    Property(String),

    /// External tool output did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// External tool could not be run or reported failure.
    #[error("tool error: {0}")]
    Tool(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GhostError {
    pub fn storage(context: impl Into<String>, source: io::Error) -> Self {
        GhostError::Storage {
            context: context.into(),
            source,
        }
    }

    /// Errno-like magnitude used as the process exit status. Never zero.
    pub fn exit_code(&self) -> u8 {
        let errno = match self {
            GhostError::Io(e) | GhostError::Storage { source: e, .. } => {
                e.raw_os_error().unwrap_or(libc::EIO)
            }
            GhostError::Config(e) => e.errno(),
            GhostError::Property(_) | GhostError::Tool(_) => libc::EIO,
            GhostError::Decode(_) => libc::EBADMSG,
            GhostError::Internal(_) => libc::EINVAL,
        };

        match u8::try_from(errno) {
            Ok(0) | Err(_) => 1,
            Ok(code) => code,
        }
    }
}
