use std::time::Duration;

use crawl_core::RemoteStatus;
use crawl_logging::{crawl_debug, crawl_warn};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{MessageBody, StatusBody, UNKNOWN_REASON};
use crate::{ApiError, FailureKind, PollError, StartAccepted, StartError, Statistics};

const START_PATH: &str = "start_crawling";
const STATUS_PATH: &str = "crawling_status";
const STATISTICS_PATH: &str = "api/statistics";
const SAMPLE_PATH: &str = "api/data/sample";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// The remote control surface of a single crawl job.
#[async_trait::async_trait]
pub trait ControlApi: Send + Sync {
    async fn start_job(&self, target_count: u32) -> Result<StartAccepted, StartError>;

    /// Best-effort stop. Callers treat any failure as non-fatal.
    async fn stop_job(&self) -> Result<(), ApiError>;

    async fn fetch_status(&self) -> Result<RemoteStatus, PollError>;

    async fn fetch_statistics(&self) -> Result<Statistics, ApiError>;

    /// Up to `limit` sample records, pretty-printed as JSON.
    async fn fetch_sample(&self, limit: usize) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestControlApi {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestControlApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ControlApi for ReqwestControlApi {
    async fn start_job(&self, target_count: u32) -> Result<StartAccepted, StartError> {
        let url = self.endpoint(START_PATH)?;
        let body = serde_json::json!({ "target_count": target_count });
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        // The body is advisory on success; a missing or odd body still means accepted.
        let bytes = response.bytes().await.unwrap_or_default();
        let decoded: MessageBody = serde_json::from_slice(&bytes).unwrap_or_default();

        if status.is_success() {
            crawl_debug!("start accepted: {:?}", decoded.message);
            return Ok(StartAccepted {
                message: decoded.message,
            });
        }

        let reason = decoded
            .error
            .filter(|error| !error.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_REASON.to_string());
        Err(StartError::rejected(status.as_u16(), reason))
    }

    async fn stop_job(&self) -> Result<(), ApiError> {
        // The control API has no stop endpoint; only local tracking ends here.
        crawl_warn!(
            "no remote stop endpoint at {}; the crawl may keep running server-side",
            self.base_url
        );
        Ok(())
    }

    async fn fetch_status(&self) -> Result<RemoteStatus, PollError> {
        let url = self.endpoint(STATUS_PATH)?;
        let body: StatusBody = self.get_json(url).await?;
        Ok(RemoteStatus {
            is_running: body.is_running,
            progress: body.progress,
            message: body.message,
        })
    }

    async fn fetch_statistics(&self) -> Result<Statistics, ApiError> {
        let url = self.endpoint(STATISTICS_PATH)?;
        self.get_json(url).await
    }

    async fn fetch_sample(&self, limit: usize) -> Result<String, ApiError> {
        let mut url = self.endpoint(SAMPLE_PATH)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let records: Vec<serde_json::Value> = self.get_json(url).await?;
        serde_json::to_string_pretty(&records)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

/// Parses the base URL so that relative endpoint paths land underneath it.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(ApiError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme {}", url.scheme()),
        ))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
