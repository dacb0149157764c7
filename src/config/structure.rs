use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    chat::{PromptTemplates, TurnPolicy, client::providers::Provider},
    services::Credentials,
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ChatBotConfigTOML {
    pub config: ChatBotConfigInner,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatBotConfigInner {
    pub llm: LLMConfig,
    pub chatbot: ChatbotSettings,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LLMConfig {
    #[serde(default)]
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: Option<u64>,
    pub temperature: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatbotSettings {
    pub personality: String,
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub turn_policy: TurnPolicy,
    #[serde(default)]
    pub templates: PromptTemplates,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceConfig {
    AzureSearch {
        credentials: Credentials,
        top: Option<usize>,
    },
    Qdrant {
        credentials: Credentials,
        top: Option<usize>,
        embedding_model: String,
        embedding_provider: Option<Provider>,
        embedding_api_key: Option<String>,
    },
    Api {
        documentation: String,
        #[serde(default)]
        credentials: Credentials,
        #[serde(default)]
        headers: IndexMap<String, String>,
        domains: Vec<String>,
    },
}
