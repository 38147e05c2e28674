use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// This enum contains all error messages this library can return. Most fallible
/// API functions return a [`Result<(), DriftlineError>`].
///
/// [`Result<(), DriftlineError>`]: std::result::Result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DriftlineError {
    /// You made an invalid request, usually by using wrong parameters for
    /// function calls or by calling a method in the wrong session state.
    InvalidRequest {
        /// Further specifies why the request was invalid.
        info: String,
    },
    /// A configuration value was outside its permitted range.
    ConfigOutOfRange {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Minimum permitted value.
        min: u64,
        /// Maximum permitted value.
        max: u64,
        /// The value that was actually supplied.
        actual: u64,
    },
    /// Serialization or deserialization of a wire packet failed.
    Serialization {
        /// A description of what failed to serialize/deserialize.
        context: String,
    },
    /// A network socket operation failed.
    Socket {
        /// A description of the socket error.
        context: String,
    },
}

impl Display for DriftlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftlineError::InvalidRequest { info } => {
                write!(f, "Invalid request: {}", info)
            }
            DriftlineError::ConfigOutOfRange {
                field,
                min,
                max,
                actual,
            } => {
                write!(
                    f,
                    "Configuration value {} out of range: must be between {} and {}, got {}",
                    field, min, max, actual
                )
            }
            DriftlineError::Serialization { context } => {
                write!(f, "Serialization error: {}", context)
            }
            DriftlineError::Socket { context } => {
                write!(f, "Socket error: {}", context)
            }
        }
    }
}

impl Error for DriftlineError {}

impl From<crate::network::codec::CodecError> for DriftlineError {
    fn from(err: crate::network::codec::CodecError) -> Self {
        DriftlineError::Serialization {
            context: err.to_string(),
        }
    }
}
