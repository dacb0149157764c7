use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;

use super::{
    Credentials,
    search::{Document, IndexContextService, SearchBackend},
};

const API_VERSION: &str = "2023-11-01";
const SERVICE: &str = "azure search";

/// Text search against an Azure AI Search index over its REST API.
pub struct AzureSearchBackend {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    index_name: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<Document>,
}

impl AzureSearchBackend {
    /// Requires the `endpoint`, `key` and `index_name` credential fields.
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let endpoint = credentials.require(SERVICE, "endpoint")?;
        let key = credentials.require(SERVICE, "key")?;
        let index_name = credentials.require(SERVICE, "index_name")?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            index_name: index_name.to_string(),
        })
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index_name, API_VERSION
        )
    }
}

#[async_trait]
impl SearchBackend for AzureSearchBackend {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str, top: usize) -> anyhow::Result<Vec<Document>> {
        let response = self
            .client
            .post(self.search_url())
            .header("api-key", &self.key)
            .json(&json!({ "search": query, "top": top }))
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;

        Ok(response.value)
    }
}

impl IndexContextService {
    /// Cloud search index service; fails fast on missing credentials.
    pub fn azure(credentials: &Credentials) -> Result<Self> {
        Ok(Self::with_backend(Box::new(AzureSearchBackend::new(
            credentials,
        )?)))
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use crate::{
        error::Error,
        services::{ContextService, RetrieveOptions},
    };

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new()
            .with("endpoint", "https://docs.search.windows.net/")
            .with("key", "secret")
            .with("index_name", "faq")
    }

    #[test]
    fn test_valid_credentials() {
        let backend = AzureSearchBackend::new(&credentials()).unwrap();
        assert_eq!(
            backend.search_url(),
            "https://docs.search.windows.net/indexes/faq/docs/search?api-version=2023-11-01"
        );
        assert!(IndexContextService::azure(&credentials()).is_ok());
    }

    #[test]
    fn test_each_missing_field_fails_construction() {
        for field in ["endpoint", "key", "index_name"] {
            let partial: Credentials = [
                ("endpoint", "https://docs.search.windows.net"),
                ("key", "secret"),
                ("index_name", "faq"),
            ]
            .into_iter()
            .filter(|(name, _)| *name != field)
            .collect();

            let err = IndexContextService::azure(&partial).err().unwrap();
            assert!(
                matches!(&err, Error::Configuration(message) if message.contains(field)),
                "unexpected error for missing {field}: {err}"
            );
        }
    }

    #[test]
    fn test_response_keeps_field_order() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"value": [{"@search.score": 1.5, "title": "Refunds", "body": "30 days"}]}"#,
        )
        .unwrap();

        let fields: Vec<_> = response.value[0].keys().cloned().collect();
        assert_eq!(fields, vec!["@search.score", "title", "body"]);
    }

    /// Answers a single request with `status` and `body`, returning the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                request.extend_from_slice(&buffer[..read]);
                if read == 0 || request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (port, server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    fn local_service(port: u16) -> IndexContextService {
        let credentials = Credentials::new()
            .with("endpoint", format!("http://127.0.0.1:{port}/"))
            .with("key", "k")
            .with("index_name", "faq");
        let backend = AzureSearchBackend::new(&credentials)
            .unwrap()
            .http_client(reqwest::Client::builder().no_proxy().build().unwrap());
        IndexContextService::with_backend(Box::new(backend))
    }

    #[tokio::test]
    async fn test_search_request_and_flattened_context() {
        let (port, server) = serve_once(
            "200 OK",
            r#"{"value": [{"@search.score": 0.9, "title": "Refunds", "body": "30 days"}]}"#,
        )
        .await;

        let context = local_service(port)
            .retrieve_context("hi there", &RetrieveOptions::default())
            .await
            .unwrap();
        assert_eq!(context, "@search.score: 0.9\ntitle: Refunds\nbody: 30 days\n");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /indexes/faq/docs/search?api-version=2023-11-01 "));
        assert!(request.to_lowercase().contains("api-key: k\r\n"));

        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body, json!({ "search": "hi there", "top": 1 }));
    }

    #[tokio::test]
    async fn test_top_override_is_sent() {
        let (port, server) = serve_once("200 OK", r#"{"value": []}"#).await;

        let context = local_service(port)
            .retrieve_context("hi there", &RetrieveOptions { top: Some(3) })
            .await
            .unwrap();
        assert_eq!(context, "");

        let request = server.await.unwrap();
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["top"], 3);
    }

    #[tokio::test]
    async fn test_error_status_is_external_service() {
        let (port, server) = serve_once("403 Forbidden", r#"{"error": "denied"}"#).await;

        let err = local_service(port)
            .retrieve_context("hi there", &RetrieveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)), "unexpected error: {err}");

        server.await.unwrap();
    }
}
