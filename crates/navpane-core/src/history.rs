//! Navigation history: a stack of documents with no back navigation.

use crate::document::Document;

#[derive(Debug, Default)]
pub struct History {
    documents: Vec<Document>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, doc: Document) {
        self.documents.push(doc);
    }

    /// The most recently pushed document.
    pub fn current(&self) -> Option<&Document> {
        self.documents.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Document> {
        self.documents.last_mut()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }
}
