use std::io;

/// Tracks the shared push-encoder contract: the first write error is cached
/// and replayed by every later call, `close` is idempotent, and `write`/
/// `flush` fail once the encoder is closed.
#[derive(Debug, Default)]
pub struct SinkState {
    closed: bool,
    error: Option<CachedError>,
}

#[derive(Debug)]
struct CachedError {
    kind: io::ErrorKind,
    message: String,
}

impl CachedError {
    fn replay(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

impl SinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails a `write` or `flush` attempt when an error was cached or the
    /// encoder is already closed.
    pub fn check_open(&self) -> io::Result<()> {
        if let Some(error) = &self.error {
            return Err(error.replay());
        }
        if self.closed {
            return Err(io::Error::other("the encoder is closed"));
        }
        Ok(())
    }

    /// Caches the first error observed so later calls replay it.
    pub fn record<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if let Err(error) = &result {
            if self.error.is_none() {
                self.error = Some(CachedError {
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }
        result
    }

    /// Starts a `close` call. Returns the final result directly when the
    /// encoder is already closed (the cached error, without side effects);
    /// otherwise marks the encoder closed and lets the caller flush.
    pub fn enter_close(&mut self) -> Option<io::Result<()>> {
        if self.closed {
            return Some(match &self.error {
                Some(error) => Err(error.replay()),
                None => Ok(()),
            });
        }
        self.closed = true;
        None
    }
}

/// The missing-fields error for statements with empty term content.
pub fn missing_fields_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "the statement has missing fields",
    )
}

/// Rejects statements with empty IRIs or blank node ids anywhere, the
/// zero-value case every encoder must refuse.
pub fn validate_statement(statement: &crate::Statement) -> io::Result<()> {
    fn subject_ok(subject: &crate::Subject) -> bool {
        match subject {
            crate::Subject::NamedNode(n) => !n.as_str().is_empty(),
            crate::Subject::BlankNode(n) => !n.as_str().is_empty(),
            crate::Subject::Triple(t) => triple_ok(t),
        }
    }
    fn term_ok(term: &crate::Term) -> bool {
        match term {
            crate::Term::NamedNode(n) => !n.as_str().is_empty(),
            crate::Term::BlankNode(n) => !n.as_str().is_empty(),
            crate::Term::Literal(_) => true,
            crate::Term::Triple(t) => triple_ok(t),
        }
    }
    fn triple_ok(triple: &crate::Triple) -> bool {
        subject_ok(&triple.subject)
            && !triple.predicate.as_str().is_empty()
            && term_ok(&triple.object)
    }
    let graph_ok = match &statement.graph_name {
        crate::GraphName::NamedNode(n) => !n.as_str().is_empty(),
        crate::GraphName::BlankNode(n) => !n.as_str().is_empty(),
        crate::GraphName::DefaultGraph => true,
    };
    if subject_ok(&statement.subject)
        && !statement.predicate.as_str().is_empty()
        && term_ok(&statement.object)
        && graph_ok
    {
        Ok(())
    } else {
        Err(missing_fields_error())
    }
}
