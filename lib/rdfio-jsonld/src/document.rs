use rdfio_model::Cancellation;
use std::error::Error;
use std::fmt;

/// A remote JSON-LD document returned by a [`DocumentLoader`].
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    /// The final URL of the document, after redirects.
    pub document_url: String,
    /// The raw JSON bytes of the document.
    pub document: Vec<u8>,
    /// The value of an HTTP `Link` context header, when one was present.
    pub context_url: Option<String>,
}

/// The injected capability used to fetch remote `@context` documents.
///
/// No default implementation performs network access: parsing a document
/// whose context is a remote IRI fails on use unless a loader is supplied.
/// Implementations are invoked synchronously from the parse task and must
/// honor the cancellation token they are handed.
pub trait DocumentLoader {
    fn load_document(
        &self,
        iri: &str,
        cancellation: Option<&Cancellation>,
    ) -> Result<RemoteDocument, Box<dyn Error + Send + Sync>>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&str, Option<&Cancellation>) -> Result<RemoteDocument, Box<dyn Error + Send + Sync>>,
{
    fn load_document(
        &self,
        iri: &str,
        cancellation: Option<&Cancellation>,
    ) -> Result<RemoteDocument, Box<dyn Error + Send + Sync>> {
        self(iri, cancellation)
    }
}

impl<T: DocumentLoader + ?Sized> DocumentLoader for std::sync::Arc<T> {
    fn load_document(
        &self,
        iri: &str,
        cancellation: Option<&Cancellation>,
    ) -> Result<RemoteDocument, Box<dyn Error + Send + Sync>> {
        (**self).load_document(iri, cancellation)
    }
}

impl fmt::Debug for dyn DocumentLoader + Send + Sync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DocumentLoader")
    }
}
