use crate::error::RdfParseError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default cap on a physical input line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;
/// Default cap on an accumulated logical statement, in bytes.
pub const DEFAULT_MAX_STATEMENT_BYTES: usize = 4 * 1024 * 1024;
/// Default cap on collection/property-list/quoted-triple nesting.
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default cap on the number of statements emitted by one decoder.
pub const DEFAULT_MAX_STATEMENTS: u64 = 10_000_000;

const SAFE_MAX_LINE_BYTES: usize = 64 * 1024;
const SAFE_MAX_STATEMENT_BYTES: usize = 256 * 1024;
const SAFE_MAX_DEPTH: usize = 50;
const SAFE_MAX_STATEMENTS: u64 = 1_000_000;

/// A cloneable cancellation token polled by decoders before each line read
/// and before each emitted statement.
///
/// ```
/// use rdfio_model::Cancellation;
///
/// let cancellation = Cancellation::new();
/// let watcher = cancellation.clone();
/// assert!(!watcher.is_cancelled());
/// cancellation.cancel();
/// assert!(watcher.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Arc<AtomicBool>,
}

impl Cancellation {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. All clones of the token observe it.
    #[inline]
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// The limit and behavior options shared by every decoder.
///
/// Options are independent fluent setters; a zero limit normalizes back to
/// its default and `usize::MAX`/`u64::MAX` effectively disables a cap.
///
/// ```
/// use rdfio_model::ParserConfig;
///
/// let config = ParserConfig::new()
///     .with_max_depth(10)
///     .with_strict_iris(true);
/// assert_eq!(config.max_depth(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct ParserConfig {
    max_line_bytes: usize,
    max_statement_bytes: usize,
    max_depth: usize,
    max_statements: u64,
    strict_iris: bool,
    expand_containers: bool,
    quoted_triple_statements: bool,
    debug_statements: bool,
    allow_env_overrides: bool,
    cancellation: Option<Cancellation>,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            max_statement_bytes: DEFAULT_MAX_STATEMENT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_statements: DEFAULT_MAX_STATEMENTS,
            strict_iris: false,
            expand_containers: true,
            quoted_triple_statements: false,
            debug_statements: false,
            allow_env_overrides: false,
            cancellation: None,
        }
    }

    /// The halved preset for untrusted input: 64 KiB lines, 256 KiB
    /// statements, nesting depth 50 and one million statements.
    pub fn safe() -> Self {
        Self::new()
            .with_max_line_bytes(SAFE_MAX_LINE_BYTES)
            .with_max_statement_bytes(SAFE_MAX_STATEMENT_BYTES)
            .with_max_depth(SAFE_MAX_DEPTH)
            .with_max_statements(SAFE_MAX_STATEMENTS)
    }

    #[inline]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    #[inline]
    pub fn with_max_statement_bytes(mut self, max_statement_bytes: usize) -> Self {
        self.max_statement_bytes = max_statement_bytes;
        self
    }

    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn with_max_statements(mut self, max_statements: u64) -> Self {
        self.max_statements = max_statements;
        self
    }

    /// Enables RFC-3987 validation of every parsed IRI.
    #[inline]
    pub fn with_strict_iris(mut self, strict_iris: bool) -> Self {
        self.strict_iris = strict_iris;
        self
    }

    /// Controls the RDF/XML expansion of `rdf:li` into `rdf:_1`, `rdf:_2`, …
    #[inline]
    pub fn with_expand_containers(mut self, expand_containers: bool) -> Self {
        self.expand_containers = expand_containers;
        self
    }

    /// Permits a bare quoted triple as a top-level Turtle/TriG statement.
    #[inline]
    pub fn with_quoted_triple_statements(mut self, quoted_triple_statements: bool) -> Self {
        self.quoted_triple_statements = quoted_triple_statements;
        self
    }

    /// Includes the offending source fragment in parse errors.
    #[inline]
    pub fn with_debug_statements(mut self, debug_statements: bool) -> Self {
        self.debug_statements = debug_statements;
        self
    }

    /// Honors the `RDFIO_QUOTED_TRIPLE_STATEMENTS` and
    /// `RDFIO_DEBUG_STATEMENTS` environment variables. Off unless opted in.
    #[inline]
    pub fn with_allow_env_overrides(mut self, allow_env_overrides: bool) -> Self {
        self.allow_env_overrides = allow_env_overrides;
        self
    }

    /// Attaches a cancellation token.
    #[inline]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    #[inline]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    #[inline]
    pub fn max_statement_bytes(&self) -> usize {
        self.max_statement_bytes
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn max_statements(&self) -> u64 {
        self.max_statements
    }

    #[inline]
    pub fn strict_iris(&self) -> bool {
        self.strict_iris
    }

    #[inline]
    pub fn expand_containers(&self) -> bool {
        self.expand_containers
    }

    #[inline]
    pub fn quoted_triple_statements(&self) -> bool {
        self.quoted_triple_statements
    }

    #[inline]
    pub fn debug_statements(&self) -> bool {
        self.debug_statements
    }

    #[inline]
    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    /// Resolves zero limits back to their defaults and applies the opted-in
    /// environment overrides. Decoders call this once at construction.
    pub fn normalized(mut self) -> Self {
        if self.max_line_bytes == 0 {
            self.max_line_bytes = DEFAULT_MAX_LINE_BYTES;
        }
        if self.max_statement_bytes == 0 {
            self.max_statement_bytes = DEFAULT_MAX_STATEMENT_BYTES;
        }
        if self.max_depth == 0 {
            self.max_depth = DEFAULT_MAX_DEPTH;
        }
        if self.max_statements == 0 {
            self.max_statements = DEFAULT_MAX_STATEMENTS;
        }
        if self.allow_env_overrides {
            if env_flag("RDFIO_QUOTED_TRIPLE_STATEMENTS") {
                self.quoted_triple_statements = true;
            }
            if env_flag("RDFIO_DEBUG_STATEMENTS") {
                self.debug_statements = true;
            }
        }
        self
    }

    /// Converts a cancelled token into the taxonomy error.
    pub fn check_cancelled(&self, format: &'static str) -> Result<(), RdfParseError> {
        match &self.cancellation {
            Some(cancellation) if cancellation.is_cancelled() => {
                Err(RdfParseError::canceled(format))
            }
            _ => Ok(()),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
