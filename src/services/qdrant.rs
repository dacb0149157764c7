use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::{Qdrant, qdrant::SearchPointsBuilder};

use crate::{
    chat::client::providers::DynEmbeddingModel,
    error::{Error, Result},
};

use super::{
    Credentials,
    search::{Document, IndexContextService, SearchBackend},
};

const SERVICE: &str = "qdrant";

/// Vector search over a qdrant collection; the question is embedded first.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn DynEmbeddingModel>,
}

impl QdrantBackend {
    /// Requires `url` and `collection`, `api_key` is optional.
    pub fn new(credentials: &Credentials, embedder: Arc<dyn DynEmbeddingModel>) -> Result<Self> {
        let url = credentials.require(SERVICE, "url")?;
        let collection = credentials.require(SERVICE, "collection")?;

        let mut builder = Qdrant::from_url(url).skip_compatibility_check();
        if let Some(api_key) = credentials.get("api_key") {
            builder = builder.api_key(api_key.to_string());
        }

        let client = builder
            .build()
            .map_err(|e| Error::Configuration(format!("invalid qdrant client: {e}")))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            embedder,
        })
    }
}

#[async_trait]
impl SearchBackend for QdrantBackend {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str, top: usize) -> anyhow::Result<Vec<Document>> {
        let embedding = self
            .embedder
            .embed_text(query)
            .await?
            .vec
            .into_iter()
            .map(|x| x as f32)
            .collect::<Vec<f32>>();

        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding, top as u64)
                    .with_payload(true),
            )
            .await?;

        Ok(search_result
            .result
            .into_iter()
            .map(|point| {
                log::trace!("[qdrant] hit with score {}", point.score);

                let mut fields = point.payload.into_iter().collect::<Vec<_>>();
                // payloads come back as a hash map, sort for a stable context
                fields.sort_by(|(a, _), (b, _)| a.cmp(b));

                fields
                    .into_iter()
                    .map(|(field, value)| (field, value.into_json()))
                    .collect::<Document>()
            })
            .collect())
    }
}

impl IndexContextService {
    pub fn qdrant(credentials: &Credentials, embedder: Arc<dyn DynEmbeddingModel>) -> Result<Self> {
        Ok(Self::with_backend(Box::new(QdrantBackend::new(
            credentials,
            embedder,
        )?)))
    }
}
