use std::fmt::Display;

use async_trait::async_trait;

use rig::{
    OneOrMany,
    completion::{CompletionError, CompletionRequest},
    embeddings::{Embedding, EmbeddingError},
    message::AssistantContent,
    providers::{anthropic, cohere, deepseek, gemini, openai, perplexity, xai},
};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub enum ProviderClient {
    Anthropic(anthropic::Client),
    Cohere(cohere::Client),
    Deepseek(deepseek::Client),
    Gemini(gemini::Client),
    OpenAI(openai::Client),
    Perplexity(perplexity::Client),
    Xai(xai::Client),
}

#[async_trait]
pub trait DynEmbeddingModel: Send + Sync {
    async fn embed_text(&self, input: &str) -> Result<Embedding, EmbeddingError>;
}

#[async_trait]
impl<T> DynEmbeddingModel for T
where
    T: rig::embeddings::EmbeddingModel + Send + Sync,
{
    async fn embed_text(&self, input: &str) -> Result<Embedding, EmbeddingError> {
        rig::embeddings::EmbeddingModel::embed_text(self, input).await
    }
}

#[async_trait]
pub trait DynCompletionModel: Send + Sync {
    async fn completion(
        &self,
        completion: CompletionRequest,
    ) -> Result<OneOrMany<AssistantContent>, CompletionError>;
}

#[async_trait]
impl<T> DynCompletionModel for T
where
    T: rig::completion::CompletionModel + Send + Sync,
{
    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<OneOrMany<AssistantContent>, CompletionError> {
        Ok(rig::completion::CompletionModel::completion(self, request)
            .await?
            .choice)
    }
}

impl ProviderClient {
    /// Returns a completion model wrapper for the given provider and model name.
    pub fn completion_model(&self, model: &str) -> Box<dyn DynCompletionModel> {
        match self {
            ProviderClient::Anthropic(client) => Box::new(client.completion_model(model)),
            ProviderClient::Cohere(client) => Box::new(client.completion_model(model)),
            ProviderClient::Deepseek(client) => Box::new(client.completion_model(model)),
            ProviderClient::Gemini(client) => Box::new(client.completion_model(model)),
            ProviderClient::OpenAI(client) => Box::new(client.completion_model(model)),
            ProviderClient::Perplexity(client) => Box::new(client.completion_model(model)),
            ProviderClient::Xai(client) => Box::new(client.completion_model(model)),
        }
    }

    /// Returns an embedding model wrapper for the given provider and model name.
    /// Returns `None` if the provider does not support embeddings.
    /// Cohere embeds questions with the `search_query` input type.
    pub fn embedding_model(&self, model: &str) -> Option<Box<dyn DynEmbeddingModel>> {
        match self {
            ProviderClient::Anthropic(_) => None,
            ProviderClient::Cohere(client) => {
                Some(Box::new(client.embedding_model(model, "search_query")))
            }
            ProviderClient::Deepseek(_) => None,
            ProviderClient::Gemini(client) => Some(Box::new(client.embedding_model(model))),
            ProviderClient::OpenAI(client) => Some(Box::new(client.embedding_model(model))),
            ProviderClient::Perplexity(_) => None,
            ProviderClient::Xai(client) => Some(Box::new(client.embedding_model(model))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "anthropic")]
    Anthropic,

    #[serde(rename = "cohere")]
    Cohere,

    #[serde(rename = "deepseek")]
    Deepseek,

    #[serde(rename = "gemini")]
    Gemini,

    #[default]
    #[serde(rename = "openai")]
    #[serde(alias = "openai-api")]
    #[serde(alias = "openai-compatible")]
    OpenAI,

    #[serde(rename = "perplexity")]
    Perplexity,

    #[serde(rename = "xai")]
    Xai,
}

impl TryFrom<String> for Provider {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_plain::from_str(&value).map_err(|e| anyhow::anyhow!("{}", e))
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_plain::to_string(self)
            .map_err(|_| std::fmt::Error)?
            .fmt(f)
    }
}

impl Provider {
    pub fn client(
        &self,
        api_key: &str,
        custom_url: Option<&str>,
    ) -> anyhow::Result<ProviderClient> {
        Ok(match self {
            Provider::Anthropic => {
                let builder = anthropic::ClientBuilder::new(api_key);
                if let Some(url) = custom_url {
                    ProviderClient::Anthropic(builder.base_url(url).build())
                } else {
                    ProviderClient::Anthropic(builder.build())
                }
            }
            Provider::Cohere => match custom_url {
                None => ProviderClient::Cohere(cohere::Client::new(api_key)),
                Some(url) => ProviderClient::Cohere(cohere::Client::from_url(api_key, url)),
            },
            Provider::Deepseek => match custom_url {
                None => ProviderClient::Deepseek(deepseek::Client::new(api_key)),
                Some(url) => ProviderClient::Deepseek(deepseek::Client::from_url(api_key, url)),
            },
            Provider::Gemini => match custom_url {
                None => ProviderClient::Gemini(gemini::Client::new(api_key)),
                Some(url) => ProviderClient::Gemini(gemini::Client::from_url(api_key, url)),
            },
            Provider::OpenAI => match custom_url {
                None => ProviderClient::OpenAI(openai::Client::new(api_key)),
                Some(url) => ProviderClient::OpenAI(openai::Client::from_url(api_key, url)),
            },
            Provider::Perplexity => match custom_url {
                None => ProviderClient::Perplexity(perplexity::Client::new(api_key)),
                Some(url) => ProviderClient::Perplexity(perplexity::Client::from_url(api_key, url)),
            },
            Provider::Xai => match custom_url {
                None => ProviderClient::Xai(xai::Client::new(api_key)),
                Some(_) => anyhow::bail!("xai does not support a custom url"),
            },
        })
    }
}
