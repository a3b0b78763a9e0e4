//! Error types for taskconf
//!
//! Errors are structured: a kind, the config key or file they relate to,
//! the underlying cause and an actionable help message.
//!
//! Interpolation itself never fails; these errors come from loading
//! configuration sources and from the typed accessors on
//! [`ResolvedConfig`](crate::ResolvedConfig).

use std::fmt;

/// Result type alias for taskconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for taskconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Config key or file the error relates to (e.g., "db.pool.size")
    pub path: Option<String>,
    /// Line in the source file, if known
    pub line: Option<usize>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A configuration source could not be parsed
    #[error("Parse error")]
    Parse,
    /// A required key is not present in the configuration
    #[error("Required key missing: {key}")]
    MissingKey { key: String },
    /// A resolved value could not be converted to the requested type
    #[error("Type coercion failed")]
    TypeCoercion,
    /// Configuration file does not exist
    #[error("File not found")]
    FileNotFound,
    /// Any other I/O error (permission denied, invalid UTF-8, ...)
    #[error("I/O error")]
    Io,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            line: None,
            help: None,
            cause: None,
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Parse)
        }
    }

    /// Create a missing required key error
    pub fn missing_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            help: Some(format!(
                "Add '{}' to the configuration or use an accessor with a default",
                key
            )),
            ..Self::new(ErrorKind::MissingKey { key })
        }
    }

    /// Create a type coercion error
    pub fn type_coercion(
        key: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self {
            path: Some(key.into()),
            help: Some(format!(
                "Ensure the value can be converted to {}",
                expected.into()
            )),
            cause: Some(format!("Got: {}", got.into())),
            ..Self::new(ErrorKind::TypeCoercion)
        }
    }

    /// Create an I/O error for a file
    pub fn io(file: impl Into<String>, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self {
                path: Some(file.into()),
                help: Some("Check the path, or load the file as optional".into()),
                ..Self::new(ErrorKind::FileNotFound)
            };
        }
        Self {
            path: Some(file.into()),
            cause: Some(err.to_string()),
            ..Self::new(ErrorKind::Io)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add line context to the error
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether this error reports a missing key
    pub fn is_missing_key(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingKey { .. })
    }

    /// Whether this error reports a missing file
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::FileNotFound
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
