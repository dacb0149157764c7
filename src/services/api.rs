use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use url::Url;

use crate::{
    chat::{ChatMessage, client::LlmClient, prompt::template::render},
    error::{Error, Result},
};

use super::{ContextService, Credentials, RetrieveOptions};

const URL_PROMPT: &str = "You are given the below API Documentation:
{documentation}
Using this documentation, generate the full API url to call for answering the user question.
You should build the API url in order to get a response that is as short as possible, \
while still getting the necessary information to answer the question. \
Pay attention to deliberately exclude any unnecessary pieces of data in the API call.
Reply with the url only.

Question:{question}
API url:";

const ANSWER_PROMPT: &str = "You are given the below API Documentation:
{documentation}
Using this documentation, the following API url was called to answer the user question.

Question:{question}
API url: {url}

Here is the response from the API:

{response}

Summarize this response to answer the original question.

Summary:";

/// Answers questions by letting the LLM call an HTTP API it has docs for.
///
/// The LLM picks the URL, the service fetches it (only inside `domains`) and
/// the LLM then summarizes the response into the context.
pub struct ApiContextService {
    llm: Arc<dyn LlmClient>,
    documentation: String,
    credentials: Credentials,
    headers: IndexMap<String, String>,
    domains: Vec<String>,
    client: reqwest::Client,
}

impl ApiContextService {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        documentation: String,
        credentials: Credentials,
        headers: IndexMap<String, String>,
        domains: Vec<String>,
    ) -> Result<Self> {
        if domains.is_empty() {
            return Err(Error::Configuration(
                "api context service needs at least one allowed domain".to_string(),
            ));
        }

        Ok(Self {
            llm,
            documentation,
            credentials,
            headers,
            domains,
            client: reqwest::Client::new(),
        })
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        let answer = self
            .llm
            .invoke(&[ChatMessage::human(prompt)])
            .await
            .map_err(Error::ExternalService)?;

        Ok(answer.content)
    }

    async fn call(&self, url: Url) -> Result<String> {
        let mut request = self.client.get(url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if let Some(token) = self.credentials.get("token") {
            request = request.bearer_auth(token);
        } else if let Some(username) = self.credentials.get("username") {
            request = request.basic_auth(username, self.credentials.get("password"));
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(Error::external)?;

        response.text().await.map_err(Error::external)
    }
}

#[async_trait]
impl ContextService for ApiContextService {
    fn name(&self) -> &str {
        "api"
    }

    async fn retrieve_context(&self, question: &str, _options: &RetrieveOptions) -> Result<String> {
        let raw_url = self
            .ask(render(
                URL_PROMPT,
                &[("documentation", &self.documentation), ("question", question)],
            ))
            .await?;
        let raw_url = raw_url.trim();

        let url = Url::parse(raw_url).map_err(|_| Error::DomainNotAllowed(raw_url.to_string()))?;
        if !is_allowed(&url, &self.domains) {
            return Err(Error::DomainNotAllowed(raw_url.to_string()));
        }

        log::info!("[api] calling {url}");
        let response = self.call(url.clone()).await?;

        self.ask(render(
            ANSWER_PROMPT,
            &[
                ("documentation", &self.documentation),
                ("question", question),
                ("url", url.as_str()),
                ("response", &response),
            ],
        ))
        .await
    }
}

/// Entries with a scheme must match scheme, host and port; bare entries
/// (`api.example.com`) only the host.
fn is_allowed(url: &Url, domains: &[String]) -> bool {
    domains.iter().any(|domain| match Url::parse(domain) {
        Ok(allowed) if domain.contains("://") => {
            allowed.scheme() == url.scheme()
                && allowed.host_str() == url.host_str()
                && allowed.port_or_known_default() == url.port_or_known_default()
        }
        _ => url.host_str() == Some(domain.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Replies with the scripted answers in order, keeping every prompt.
    struct ScriptedLlm {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn invoke(&self, history: &[ChatMessage]) -> anyhow::Result<ChatMessage> {
            self.prompts
                .lock()
                .unwrap()
                .push(history.last().map(|m| m.content.clone()).unwrap_or_default());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(anyhow::anyhow!("script exhausted"))?;
            Ok(ChatMessage::ai(reply))
        }
    }

    fn service(llm: Arc<ScriptedLlm>, domains: &[&str]) -> ApiContextService {
        ApiContextService::new(
            llm,
            "GET /weather?city=<name> returns the forecast".to_string(),
            Credentials::new().with("token", "abc"),
            IndexMap::from([("Accept".to_string(), "text/plain".to_string())]),
            domains.iter().map(|d| d.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_domains_fail_construction() {
        let err = ApiContextService::new(
            ScriptedLlm::new(&[]),
            String::new(),
            Credentials::new(),
            IndexMap::new(),
            vec![],
        )
        .err()
        .unwrap();

        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_domain_matching() {
        let url = Url::parse("https://api.example.com/v1/items").unwrap();

        assert!(is_allowed(&url, &["https://api.example.com".to_string()]));
        assert!(is_allowed(&url, &["api.example.com".to_string()]));
        assert!(!is_allowed(&url, &["http://api.example.com".to_string()]));
        assert!(!is_allowed(&url, &["https://example.com".to_string()]));
        assert!(!is_allowed(&url, &["https://api.example.com:8443".to_string()]));
    }

    #[tokio::test]
    async fn test_disallowed_url_is_never_called() {
        let llm = ScriptedLlm::new(&["  https://evil.test/steal  "]);
        let service = service(llm.clone(), &["https://api.example.com"]);

        let err = service
            .retrieve_context("weather in Lisbon?", &RetrieveOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DomainNotAllowed(url) if url == "https://evil.test/steal"));
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_calls_api_and_summarizes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 4096];
            let read = socket.read(&mut buffer).await.unwrap();
            let body = "sunny, 24C";
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buffer[..read]).to_string()
        });

        let url = format!("http://127.0.0.1:{port}/weather?city=Lisbon");
        let llm = ScriptedLlm::new(&[url.as_str(), "It is sunny and 24C in Lisbon."]);
        let service = service(llm.clone(), &["127.0.0.1"])
            .http_client(reqwest::Client::builder().no_proxy().build().unwrap());

        let context = service
            .retrieve_context("weather in Lisbon?", &RetrieveOptions::default())
            .await
            .unwrap();
        assert_eq!(context, "It is sunny and 24C in Lisbon.");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /weather?city=lisbon"));
        assert!(request.contains("authorization: bearer abc"));
        assert!(request.contains("accept: text/plain"));

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Question:weather in Lisbon?"));
        assert!(prompts[1].contains("sunny, 24C"));
        assert!(prompts[1].contains(&url));
    }
}
