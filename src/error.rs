//! Error types for ormlift.

use thiserror::Error;

/// The main error type for ormlift operations.
///
/// Rewrite stages never fail; they skip what they cannot match. Errors
/// only come from reading input: source that does not parse, a broken
/// config file, or I/O.
#[derive(Debug, Error)]
pub enum CodemodError {
    /// Failed to parse the source file.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML in a config file.
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CodemodError {
    /// Create a parse error at the given byte position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// 1-based line and column of a parse error within `source`.
    pub fn line_col(&self, source: &str) -> Option<(usize, usize)> {
        let Self::Parse { position, .. } = self else {
            return None;
        };
        let before = source.get(..*position)?;
        let line = before.matches('\n').count() + 1;
        let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Some((line, col))
    }
}

/// Result type alias for ormlift operations.
pub type CodemodResult<T> = Result<T, CodemodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodemodError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_line_col() {
        let err = CodemodError::parse(8, "x");
        assert_eq!(err.line_col("abc\ndef\nghi"), Some((3, 1)));
        assert_eq!(CodemodError::Config("x".into()).line_col("abc"), None);
    }
}
