//! Error types for the signature analyzer

use thiserror::Error;

/// Analyzer errors
///
/// Only structural problems with the input are errors. Problems confined to
/// a single record (unresolvable callee, recursive type, nesting cap) are
/// reported as placeholders and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Reference to a function id that is not in the module
    #[error("Unknown function id: {id}")]
    UnknownFunction {
        /// Function id
        id: u32,
    },

    /// Reference to a block id outside the function layout
    ///
    /// **Triggered by:** A branch target or loop member that does not exist
    #[error("Unknown block {block} in function {function}")]
    UnknownBlock {
        /// Function name
        function: String,
        /// Block id
        block: u32,
    },

    /// Reference to a type id that is not in the type table
    #[error("Unknown type id: {id}")]
    UnknownType {
        /// Type id
        id: u32,
    },

    /// Reference to an instruction id that is not in the function
    #[error("Unknown instruction {inst} in function {function}")]
    UnknownInstruction {
        /// Function name
        function: String,
        /// Instruction id
        inst: u32,
    },

    /// Attempt to analyze a function without a body
    #[error("Function {name} is a declaration and has no body")]
    Declaration {
        /// Function name
        name: String,
    },

    /// Malformed module structure
    ///
    /// **Triggered by:** Block ids that do not match layout positions,
    /// duplicate instruction ids
    #[error("Invalid module: {0}")]
    InvalidModule(String),

    /// Invalid analysis options
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure while reading options
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding of a report failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The run cannot continue
    Fatal,
    /// Only the current function is affected; the batch can continue
    Recoverable,
}

impl Error {
    /// Create a configuration error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Config(_) | Error::Io(_) | Error::Serialization(_) => ErrorSeverity::Fatal,
            Error::UnknownFunction { .. }
            | Error::UnknownBlock { .. }
            | Error::UnknownType { .. }
            | Error::UnknownInstruction { .. }
            | Error::Declaration { .. }
            | Error::InvalidModule(_) => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, Error>;
