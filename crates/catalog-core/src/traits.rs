use crate::types::{PartialEntry, RawDocument, SearchQuery, SearchResult};

pub trait Extractor: Send + Sync {
    /// Every product entity the document describes, primary entity first.
    fn extract_all(&self, doc: &RawDocument) -> Vec<PartialEntry>;

    /// The document's primary entity, if it resolves to an identifier.
    fn extract(&self, doc: &RawDocument) -> Option<PartialEntry> {
        self.extract_all(doc).into_iter().next()
    }
}

pub trait SearchEngine: Send + Sync {
    fn search(&self, query: &SearchQuery) -> SearchResult;
}
