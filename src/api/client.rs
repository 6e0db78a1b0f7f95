//! Backend gateway client.
//!
//! Thin wrapper over the investigation backend's REST API. Every request
//! carries the session cookie. Reads are retried on transient failures,
//! mutations are sent exactly once.

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument, warn};

use super::auth::SessionToken;
use super::error::{ApiError, Result};
use super::progress::ImportProgressStream;
use super::types::{
    BookmarksRequest, CreateProjectRequest, ExportRequest, Message, NetworkGraph, Project,
    SearchRequest, SetProjectRequest, TagRequest, TreeNode,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for idempotent reads.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Client for the investigation backend.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    /// HTTP client without a total timeout, for the progress stream.
    stream_client: Client,
    base_url: String,
    session: SessionToken,
}

impl GatewayClient {
    /// Create a client with an explicit session.
    pub fn new(base_url: &str, session: SessionToken) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;
        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            stream_client,
            base_url: normalize_base_url(base_url),
            session,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Download URL for a file produced by an export or report.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/file/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// `GET /projects`
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let projects: Option<Vec<Project>> = self.get(&self.url("/projects")).await?;
        let projects = projects.unwrap_or_default();
        debug!(count = projects.len(), "Fetched projects");
        Ok(projects)
    }

    /// `POST /projects`
    #[instrument(skip(self))]
    pub async fn create_project(&self, name: &str) -> Result<Project> {
        let body = CreateProjectRequest {
            name: name.to_string(),
        };
        let project: Project = self.post_json(&self.url("/projects"), &body).await?;
        info!(uuid = %project.uuid, "Created project");
        Ok(project)
    }

    /// `POST /setProject`
    #[instrument(skip(self))]
    pub async fn set_project(&self, uuid: &str) -> Result<()> {
        let body = SetProjectRequest {
            uuid: uuid.to_string(),
        };
        self.post_text(&self.url("/setProject"), &body).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Evidence and messages
    // ------------------------------------------------------------------

    /// `GET /tree`
    #[instrument(skip(self))]
    pub async fn evidence_tree(&self) -> Result<Vec<TreeNode>> {
        let nodes: Option<Vec<TreeNode>> = self.get(&self.url("/tree")).await?;
        Ok(nodes.unwrap_or_default())
    }

    /// `POST /search`. A `null` response is an empty result.
    #[instrument(skip(self))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Message>> {
        let messages: Option<Vec<Message>> =
            self.post_json(&self.url("/search"), request).await?;
        let messages = messages.unwrap_or_default();
        debug!(count = messages.len(), "Search returned messages");
        Ok(messages)
    }

    /// `GET /bookmarks`
    #[instrument(skip(self))]
    pub async fn list_bookmarks(&self) -> Result<Vec<Message>> {
        let messages: Option<Vec<Message>> = self.get(&self.url("/bookmarks")).await?;
        Ok(messages.unwrap_or_default())
    }

    /// `POST /bookmarks` with a batch of message ids.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn add_bookmarks(&self, ids: &[String]) -> Result<String> {
        let body = BookmarksRequest {
            bookmarks: ids.to_vec(),
        };
        self.post_text(&self.url("/bookmarks"), &body).await
    }

    /// `DELETE /bookmark/{id}`
    #[instrument(skip(self))]
    pub async fn remove_bookmark(&self, id: &str) -> Result<String> {
        let url = self.url(&format!("/bookmark/{}", urlencoding::encode(id)));
        let request = self.authorized(self.client.delete(&url));
        let response = request.send().await?;
        handle_text_response(response).await
    }

    /// `POST /tag` with a batch of message ids.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn add_tag(&self, ids: &[String], tag: &str) -> Result<String> {
        let body = TagRequest {
            messages: ids.to_vec(),
            tag: tag.to_string(),
        };
        self.post_text(&self.url("/tag"), &body).await
    }

    // ------------------------------------------------------------------
    // Analysis and output
    // ------------------------------------------------------------------

    /// `GET /network`
    #[instrument(skip(self))]
    pub async fn network(&self) -> Result<NetworkGraph> {
        self.get(&self.url("/network")).await
    }

    /// `POST /export`. Returns the path of the exported archive.
    #[instrument(skip(self))]
    pub async fn export_attachments(&self, extensions: &str) -> Result<String> {
        let body = ExportRequest {
            extensions: extensions.to_string(),
        };
        self.post_text(&self.url("/export"), &body).await
    }

    /// `POST /report`. Returns the path of the generated report.
    #[instrument(skip(self))]
    pub async fn create_report(&self) -> Result<String> {
        self.post_text(&self.url("/report"), &serde_json::json!({}))
            .await
    }

    /// `GET /outlook/loading?stream={project_id}` as a server-sent event stream.
    #[instrument(skip(self))]
    pub async fn import_progress(&self, project_id: &str) -> Result<ImportProgressStream> {
        let url = self.url(&format!(
            "/outlook/loading?stream={}",
            urlencoding::encode(project_id)
        ));
        let response = self
            .authorized(self.stream_client.get(&url))
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &url, &body));
        }
        Ok(ImportProgressStream::new(response))
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::COOKIE, self.session.header_value())
    }

    /// Perform a GET request, retrying transient failures.
    #[instrument(skip(self), fields(url = %url))]
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempts = 0;
        let mut last_error: Option<ApiError> = None;

        while attempts < MAX_RETRIES {
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, MAX_RETRIES);

            match self.execute_get::<T>(url).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if is_retryable(&e) && attempts < MAX_RETRIES {
                        let delay = calculate_retry_delay(attempts);
                        warn!(
                            "Request failed (attempt {}), retrying in {}ms: {}",
                            attempts, delay, e
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::ServerError("Max retries exceeded".to_string())))
    }

    async fn execute_get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .authorized(self.client.get(url))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        handle_json_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .authorized(self.client.post(url))
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        handle_json_response(response).await
    }

    async fn post_text<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<String> {
        let response = self
            .authorized(self.client.post(url))
            .json(body)
            .send()
            .await?;
        handle_text_response(response).await
    }
}

/// Check the status and parse a JSON body.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().to_string();

    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    } else {
        let body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", body);
        Err(error_from_response(status, &url, &body))
    }
}

/// Check the status and return the body as a status message.
async fn handle_text_response(response: Response) -> Result<String> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();

    if status.is_success() {
        Ok(extract_message(&body).unwrap_or(body))
    } else {
        debug!("Error response body: {}", body);
        Err(error_from_response(status, &url, &body))
    }
}

/// Pull a human-readable message out of a response body.
///
/// The backend answers with a bare string, a JSON string, or an object with
/// a `message`/`error` field.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) => Some(s),
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(inner) => inner
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                _ => None,
            }),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Create an appropriate error from an HTTP response.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        _ => match extract_message(body) {
            Some(message) => ApiError::Rejected {
                status: status.as_u16(),
                message,
            },
            None => ApiError::from_status(status, url),
        },
    }
}

/// Check if an error is retryable.
fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_) => true,
        ApiError::Rejected { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Calculate retry delay with exponential backoff.
fn calculate_retry_delay(attempt: u32) -> u64 {
    RETRY_DELAY_MS * 2u64.pow(attempt - 1)
}

/// Remove trailing slashes from the base URL.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. Session cookies travel in clear text.", url);
    }

    url.to_string()
}
