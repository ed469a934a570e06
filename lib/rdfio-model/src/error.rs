use std::error::Error;
use std::{fmt, io};

/// The closed set of decoder failure classes.
///
/// The kind of an error is recoverable through arbitrary wrapping with
/// [`ErrorKind::of`], so callers can classify failures without keeping a
/// reference to the original error value. End of input is never an error:
/// iterators simply finish.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The requested format name is not recognized.
    UnsupportedFormat,
    /// A physical input line exceeded the configured byte cap.
    LineTooLong,
    /// An accumulated logical statement exceeded the configured byte cap.
    StatementTooLong,
    /// Collection, property list or quoted triple nesting exceeded the cap.
    DepthExceeded,
    /// The decoder emitted as many statements as the configured cap allows.
    StatementLimitExceeded,
    /// The attached cancellation token was triggered.
    Canceled,
    /// The underlying byte source failed.
    Io,
    /// Any other lexical or grammatical failure.
    Syntax,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported format",
            Self::LineTooLong => "line too long",
            Self::StatementTooLong => "statement too long",
            Self::DepthExceeded => "depth exceeded",
            Self::StatementLimitExceeded => "statement limit exceeded",
            Self::Canceled => "canceled",
            Self::Io => "i/o error",
            Self::Syntax => "syntax error",
        }
    }

    /// Recovers the kind from any error whose `source()` chain contains an
    /// [`RdfParseError`], however deeply wrapped.
    ///
    /// ```
    /// use rdfio_model::{ErrorKind, RdfParseError};
    /// use std::io;
    ///
    /// let error = RdfParseError::canceled("Turtle");
    /// let wrapped = io::Error::other(error);
    /// assert_eq!(ErrorKind::of(&wrapped), Some(ErrorKind::Canceled));
    /// ```
    pub fn of(error: &(dyn Error + 'static)) -> Option<Self> {
        let mut current: Option<&(dyn Error + 'static)> = Some(error);
        while let Some(e) = current {
            if let Some(e) = e.downcast_ref::<RdfParseError>() {
                return Some(e.kind());
            }
            current = e.source();
        }
        None
    }
}

impl fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position in the input: 1-based line and column (in code points), 0-based
/// byte offset.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct TextPosition {
    pub line: u64,
    pub column: u64,
    pub offset: u64,
}

impl TextPosition {
    #[inline]
    pub fn new(line: u64, column: u64, offset: u64) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for TextPosition {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// A decoder failure: one [`ErrorKind`] plus the format name, a message, and
/// where available the position and the offending statement text.
#[derive(Debug)]
pub struct RdfParseError {
    kind: ErrorKind,
    format: &'static str,
    message: String,
    position: Option<TextPosition>,
    statement: Option<String>,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl RdfParseError {
    /// Builds a [`ErrorKind::Syntax`] error from a printable message.
    pub fn syntax(format: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, format, message.into())
    }

    /// Wraps an I/O failure, unwrapping any [`RdfParseError`] it carries so
    /// that round-tripping through [`io::Error`] is lossless.
    pub fn io(format: &'static str, error: io::Error) -> Self {
        if error.get_ref().is_some_and(|e| e.is::<Self>()) {
            if let Some(inner) = error
                .into_inner()
                .and_then(|e| e.downcast::<Self>().ok())
            {
                return *inner;
            }
            // get_ref lied; unreachable in practice
            return Self::new(ErrorKind::Io, format, "i/o error");
        }
        let mut this = Self::new(ErrorKind::Io, format, error.to_string());
        this.source = Some(Box::new(error));
        this
    }

    pub fn unsupported_format(name: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedFormat,
            "",
            format!("unsupported RDF format {name:?}"),
        )
    }

    pub fn line_too_long(format: &'static str, max_line_bytes: usize) -> Self {
        Self::new(
            ErrorKind::LineTooLong,
            format,
            format!("line longer than {max_line_bytes} bytes"),
        )
    }

    pub fn statement_too_long(format: &'static str, max_statement_bytes: usize) -> Self {
        Self::new(
            ErrorKind::StatementTooLong,
            format,
            format!("statement longer than {max_statement_bytes} bytes"),
        )
    }

    pub fn depth_exceeded(format: &'static str, max_depth: usize) -> Self {
        Self::new(
            ErrorKind::DepthExceeded,
            format,
            format!("nesting deeper than {max_depth} levels"),
        )
    }

    pub fn statement_limit_exceeded(format: &'static str, max_statements: u64) -> Self {
        Self::new(
            ErrorKind::StatementLimitExceeded,
            format,
            format!("more than {max_statements} statements"),
        )
    }

    pub fn canceled(format: &'static str) -> Self {
        Self::new(ErrorKind::Canceled, format, "parsing was canceled")
    }

    fn new(kind: ErrorKind, format: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            format,
            message: message.into(),
            position: None,
            statement: None,
            source: None,
        }
    }

    /// Attaches the input position.
    #[must_use]
    pub fn with_position(mut self, position: TextPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Attaches the offending statement text (`debug_statements` option).
    #[must_use]
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    /// Attaches an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The name of the format the failing decoder was parsing, empty when
    /// unknown.
    #[inline]
    pub fn format(&self) -> &'static str {
        self.format
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn position(&self) -> Option<TextPosition> {
        self.position
    }

    /// The offending statement text, present when `debug_statements` is on.
    #[inline]
    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }
}

impl fmt::Display for RdfParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.format.is_empty() {
            write!(f, "{} ", self.format)?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(position) = self.position {
            write!(f, " at {position}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(statement) = &self.statement {
            write!(f, " in statement {statement:?}")?;
        }
        Ok(())
    }
}

impl Error for RdfParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

impl From<io::Error> for RdfParseError {
    #[inline]
    fn from(error: io::Error) -> Self {
        Self::io("", error)
    }
}

impl From<RdfParseError> for io::Error {
    fn from(error: RdfParseError) -> Self {
        match error.kind {
            ErrorKind::Io => match error.source {
                Some(source) => match source.downcast::<Self>() {
                    Ok(io_error) => *io_error,
                    Err(source) => Self::other(source),
                },
                None => Self::other(error.message),
            },
            ErrorKind::Canceled => Self::new(io::ErrorKind::Interrupted, error),
            _ => Self::new(io::ErrorKind::InvalidData, error),
        }
    }
}
