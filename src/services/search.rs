use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};

use super::{ContextService, RetrievalContextService, RetrieveOptions};

/// One search hit, fields in the order the backend returned them.
pub type Document = IndexMap<String, Value>;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short label for logs and error messages.
    fn name(&self) -> &str;

    async fn search(&self, query: &str, top: usize) -> anyhow::Result<Vec<Document>>;
}

/// Context service answering from a search index.
///
/// Every field of every returned document is flattened into a
/// `"{field}: {value}"` line, documents and fields kept in backend order.
pub struct IndexContextService {
    backend: Box<dyn SearchBackend>,
    default_top: usize,
}

impl IndexContextService {
    pub const DEFAULT_TOP: usize = 1;

    pub fn with_backend(backend: Box<dyn SearchBackend>) -> Self {
        Self {
            backend,
            default_top: Self::DEFAULT_TOP,
        }
    }

    /// Result limit used when the caller doesn't pass one.
    pub fn default_top(mut self, top: usize) -> Self {
        self.default_top = top;
        self
    }
}

#[async_trait]
impl ContextService for IndexContextService {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn retrieve_context(&self, question: &str, options: &RetrieveOptions) -> Result<String> {
        let top = options.top.unwrap_or(self.default_top);

        let documents = self
            .backend
            .search(question, top)
            .await
            .map_err(Error::ExternalService)?;

        log::debug!(
            "[{}] {} document(s) for \"{}\"",
            self.backend.name(),
            documents.len(),
            question
        );

        Ok(flatten_documents(&documents))
    }
}

impl RetrievalContextService for IndexContextService {}

pub fn flatten_documents(documents: &[Document]) -> String {
    let mut flattened = String::new();
    for document in documents {
        for (field, value) in document {
            flattened.push_str(field);
            flattened.push_str(": ");
            match value {
                Value::String(text) => flattened.push_str(text),
                other => flattened.push_str(&other.to_string()),
            }
            flattened.push('\n');
        }
    }
    flattened
}
