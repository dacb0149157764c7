use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    chat::client::LlmClient,
    config::structure::{LLMConfig, ServiceConfig},
    error::{Error, Result},
};

pub mod api;
pub mod azure;
pub mod qdrant;
pub mod search;

pub use api::ApiContextService;
pub use search::{Document, IndexContextService, SearchBackend};

/// Per-call retrieval knobs. Unset fields fall back to the service's defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetrieveOptions {
    pub top: Option<usize>,
}

/// Something that, given a question, returns text relevant to answering it.
#[async_trait]
pub trait ContextService: Send + Sync {
    fn name(&self) -> &str;

    async fn retrieve_context(&self, question: &str, options: &RetrieveOptions) -> Result<String> {
        let _ = (question, options);
        Err(Error::UnsupportedOperation(format!(
            "{} does not implement retrieve_context",
            self.name()
        )))
    }
}

/// Context services that answer from a search index rather than a live API.
pub trait RetrievalContextService: ContextService {}

/// Opaque credential fields for a context service, validated on construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(IndexMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn require(&self, service: &str, field: &str) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| Error::missing_credential(service, field))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl ServiceConfig {
    /// Builds the configured context service. `llm` is shared with the
    /// API-backed service, `llm_config` supplies embedding fallbacks.
    pub fn build(
        &self,
        llm: &Arc<dyn LlmClient>,
        llm_config: &LLMConfig,
    ) -> Result<Box<dyn ContextService>> {
        let service: Box<dyn ContextService> = match self {
            ServiceConfig::AzureSearch { credentials, top } => {
                let service = IndexContextService::azure(credentials)?;
                Box::new(match top {
                    Some(top) => service.default_top(*top),
                    None => service,
                })
            }
            ServiceConfig::Qdrant {
                credentials,
                top,
                embedding_model,
                embedding_provider,
                embedding_api_key,
            } => {
                let provider = embedding_provider.unwrap_or(llm_config.provider);
                let api_key = embedding_api_key.as_ref().unwrap_or(&llm_config.api_key);
                let base_url = match embedding_provider {
                    Some(_) => None,
                    None => llm_config.base_url.as_deref(),
                };

                let embedder = provider
                    .client(api_key, base_url)
                    .map_err(|e| Error::Configuration(e.to_string()))?
                    .embedding_model(embedding_model)
                    .ok_or_else(|| {
                        Error::Configuration(format!("{provider} does not provide embeddings"))
                    })?;

                let service = IndexContextService::qdrant(credentials, Arc::from(embedder))?;
                Box::new(match top {
                    Some(top) => service.default_top(*top),
                    None => service,
                })
            }
            ServiceConfig::Api {
                documentation,
                credentials,
                headers,
                domains,
            } => Box::new(ApiContextService::new(
                llm.clone(),
                documentation.clone(),
                credentials.clone(),
                headers.clone(),
                domains.clone(),
            )?),
        };

        Ok(service)
    }
}
