use api_structs::{
    ErrorDetail, ErrorListQuery, ErrorListResponse, HealthResponse, StatsSnapshot,
    TriggerCycleResponse,
};
use backtraced_error::{ReqwestError, SerdeJsonError};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Nothing found at {url}")]
    NotFound { url: String },
    #[error("Got non 200 status code {status} from {url} and body: {body}")]
    Non200Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Got unexpected response from {url}")]
    UnexpectedResponse {
        url: String,
        #[source]
        error: SerdeJsonError,
    },
    #[error("http error")]
    Http(#[from] ReqwestError),
    #[error("{0} can't be used as API base url")]
    InvalidBaseUrl(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Read side of the RCA platform API.
#[async_trait::async_trait]
pub trait TelemetryClient: Send + Sync {
    async fn list_errors(&self, query: &ErrorListQuery) -> Result<ErrorListResponse, Error>;
    async fn stats(&self) -> Result<StatsSnapshot, Error>;
    async fn error_detail(&self, id: &str) -> Result<ErrorDetail, Error>;
    /// Payload of the download endpoint, kept opaque since it is only written to disk.
    async fn error_export(&self, id: &str) -> Result<serde_json::Value, Error>;
    async fn health(&self) -> Result<HealthResponse, Error>;
    async fn trigger_cycle(&self) -> Result<TriggerCycleResponse, Error>;
}

#[derive(Debug, Clone)]
pub struct HttpTelemetryClient {
    client: reqwest::Client,
    api_url: Url,
    request_timeout: Duration,
}

impl HttpTelemetryClient {
    pub fn new(api_url: Url, request_timeout: Duration) -> Result<Self, Error> {
        if api_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(api_url.to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_url,
            request_timeout,
        })
    }

    /// Appends percent encoded `segments` to the base url path.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, Error> {
        let url = url.to_string();
        return match request.timeout(self.request_timeout).send().await {
            Ok(response) if response.status().is_success() => {
                let body = response.text().await.map_err(|e| {
                    ReqwestError::from_reqwest_error(e, format!("reading body of {url}"))
                })?;
                let decoded: T =
                    serde_json::from_str(&body).map_err(|e| Error::UnexpectedResponse {
                        error: SerdeJsonError::from_serde_json_error(
                            e,
                            format!("decoding response of {url}"),
                            &body,
                        ),
                        url: url.clone(),
                    })?;
                Ok(decoded)
            }
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                Err(Error::NotFound { url })
            }
            Ok(response) => {
                let status = response.status();
                Err(Error::Non200Status {
                    url,
                    status,
                    body: response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("error decoding body: {:?}", e)),
                })
            }
            Err(e) => Err(Error::Http(ReqwestError::from_reqwest_error(
                e,
                format!("sending request to {url}"),
            ))),
        };
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.endpoint(segments);
        debug!("GET {url}");
        self.send_and_decode(self.client.get(url.clone()), &url)
            .await
    }
}

#[async_trait::async_trait]
impl TelemetryClient for HttpTelemetryClient {
    #[instrument(skip_all)]
    async fn list_errors(&self, query: &ErrorListQuery) -> Result<ErrorListResponse, Error> {
        let url = self.endpoint(&["errors"]);
        debug!("GET {url} with {query:?}");
        self.send_and_decode(self.client.get(url.clone()).query(query), &url)
            .await
    }

    #[instrument(skip_all)]
    async fn stats(&self) -> Result<StatsSnapshot, Error> {
        self.get(&["stats"]).await
    }

    #[instrument(skip(self))]
    async fn error_detail(&self, id: &str) -> Result<ErrorDetail, Error> {
        self.get(&["errors", id]).await
    }

    #[instrument(skip(self))]
    async fn error_export(&self, id: &str) -> Result<serde_json::Value, Error> {
        self.get(&["errors", id, "download"]).await
    }

    #[instrument(skip_all)]
    async fn health(&self) -> Result<HealthResponse, Error> {
        self.get(&["health"]).await
    }

    #[instrument(skip_all)]
    async fn trigger_cycle(&self) -> Result<TriggerCycleResponse, Error> {
        let url = self.endpoint(&["trigger-cycle"]);
        debug!("POST {url}");
        self.send_and_decode(self.client.post(url.clone()), &url)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpTelemetryClient {
        HttpTelemetryClient::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoints_are_appended_to_base_path() {
        let with_slash = client("http://127.0.0.1:8000/api/");
        let without_slash = client("http://127.0.0.1:8000/api");
        for c in [with_slash, without_slash] {
            assert_eq!(
                c.endpoint(&["errors", "E1", "download"]).as_str(),
                "http://127.0.0.1:8000/api/errors/E1/download"
            );
        }
    }

    #[test]
    fn ids_are_percent_encoded() {
        let c = client("http://127.0.0.1:8000/api");
        assert_eq!(
            c.endpoint(&["errors", "a/b c"]).as_str(),
            "http://127.0.0.1:8000/api/errors/a%2Fb%20c"
        );
    }

    #[test]
    fn poll_query_sends_empty_filters() {
        let c = client("http://127.0.0.1:8000/api");
        let request = c
            .client
            .get(c.endpoint(&["errors"]))
            .query(&ErrorListQuery::default())
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("env=&service=&hours=24"));
    }

    #[test]
    fn rejects_non_base_urls() {
        let res = HttpTelemetryClient::new(
            Url::parse("mailto:ops@example.com").unwrap(),
            Duration::from_secs(1),
        );
        assert!(matches!(res, Err(Error::InvalidBaseUrl(_))));
    }
}
