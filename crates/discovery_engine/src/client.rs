use std::time::Duration;

use discovery_core::{Job, JobId, Query, Supplier};
use discovery_logging::discovery_debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ClientError, FailureKind};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Asynchronous job contract: submit, check status, read results.
#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    async fn submit(&self, query: &Query) -> Result<Job, ClientError>;

    async fn poll_status(&self, job_id: &JobId) -> Result<Job, ClientError>;

    /// Only meaningful once the job reports `completed`.
    async fn fetch_results(&self, job_id: &JobId) -> Result<Vec<Supplier>, ClientError>;
}

/// Result of the synchronous results call. `summary` is whatever the backend sent, if anything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyResults {
    pub suppliers: Vec<Supplier>,
    pub summary: Option<String>,
}

/// Older synchronous contract: one blocking query, then a results lookup by query.
#[async_trait::async_trait]
pub trait LegacyClient: Send + Sync {
    async fn legacy_query(&self, query: &Query) -> Result<(), ClientError>;

    async fn legacy_results(&self, query: &Query) -> Result<LegacyResults, ClientError>;
}

#[derive(Serialize)]
struct QueryBody<'a> {
    component: &'a str,
    country: &'a str,
}

impl<'a> From<&'a Query> for QueryBody<'a> {
    fn from(query: &'a Query) -> Self {
        Self {
            component: &query.component,
            country: &query.country,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyBody {
    Bare(Vec<Supplier>),
    Wrapped {
        #[serde(default)]
        suppliers: Vec<Supplier>,
        #[serde(default)]
        summary: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ReqwestJobClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestJobClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ClientError> {
        discovery_debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    async fn post_query(&self, url: Url, query: &Query) -> Result<Vec<u8>, ClientError> {
        discovery_debug!("POST {}", url);
        let body = serde_json::to_vec(&QueryBody::from(query))
            .map_err(|err| ClientError::malformed(err.to_string()))?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("request rejected"),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(body.to_vec())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, ClientError> {
    serde_json::from_slice(body)
        .map_err(|err| ClientError::malformed(format!("could not read {what}: {err}")))
}

fn ensure_job_id(job: Job) -> Result<Job, ClientError> {
    if job.id.is_blank() {
        return Err(ClientError::malformed("job response has an empty _id"));
    }
    Ok(job)
}

#[async_trait::async_trait]
impl JobClient for ReqwestJobClient {
    async fn submit(&self, query: &Query) -> Result<Job, ClientError> {
        let url = self.endpoint(&["discovery", "query", "async"])?;
        let body = self.post_query(url, query).await?;
        let mut job = ensure_job_id(decode::<Job>(&body, "submitted job")?)?;
        // Submit responses may carry only the id.
        if job.component.is_empty() {
            job.component = query.component.clone();
        }
        if job.country.is_empty() {
            job.country = query.country.clone();
        }
        Ok(job)
    }

    async fn poll_status(&self, job_id: &JobId) -> Result<Job, ClientError> {
        let url = self.endpoint(&["discovery", "tasks", job_id.as_str()])?;
        let body = self.get_bytes(url).await?;
        ensure_job_id(decode::<Job>(&body, "job status")?)
    }

    async fn fetch_results(&self, job_id: &JobId) -> Result<Vec<Supplier>, ClientError> {
        let url = self.endpoint(&["discovery", "tasks", job_id.as_str(), "results"])?;
        let body = self.get_bytes(url).await?;
        decode(&body, "supplier list")
    }
}

#[async_trait::async_trait]
impl LegacyClient for ReqwestJobClient {
    async fn legacy_query(&self, query: &Query) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "discovery", "query"])?;
        // The synchronous endpoint answers with suppliers too, but results are read separately.
        self.post_query(url, query).await.map(|_| ())
    }

    async fn legacy_results(&self, query: &Query) -> Result<LegacyResults, ClientError> {
        let mut url = self.endpoint(&["api", "discovery", "results"])?;
        url.query_pairs_mut()
            .append_pair("component", &query.component)
            .append_pair("country", &query.country);
        let body = self.get_bytes(url).await?;
        let results = match decode::<LegacyBody>(&body, "legacy results")? {
            LegacyBody::Bare(suppliers) => LegacyResults {
                suppliers,
                summary: None,
            },
            LegacyBody::Wrapped { suppliers, summary } => LegacyResults { suppliers, summary },
        };
        Ok(results)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::malformed(err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
