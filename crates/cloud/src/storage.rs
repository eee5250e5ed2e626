use std::time::Duration;

use chrono::Utc;
use portal_core::IngestTarget;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Deserialize;

use crate::error::{CloudError, Result};
use crate::shared_key::{CanonicalRequest, SharedKeyCredential};

pub const STORAGE_API_VERSION: &str = "2023-11-03";

const METADATA_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub account: String,
    pub access_key: String,
    pub container: String,
    /// Overrides `https://{account}.dfs.core.windows.net`.
    pub endpoint: Option<String>,
}

/// Client for a Data Lake Gen2 filesystem.
///
/// Objects land under `{database}/{table}/{file_name}` inside the
/// configured container.
#[derive(Clone)]
pub struct DataLakeClient {
    http: Client,
    credential: SharedKeyCredential,
    endpoint: Url,
    container: String,
}

impl DataLakeClient {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let credential = SharedKeyCredential::new(&config.account, &config.access_key)?;
        let endpoint = match &config.endpoint {
            Some(raw) => Url::parse(raw).map_err(|err| {
                CloudError::Config(format!("invalid storage endpoint {raw}: {err}"))
            })?,
            None => Url::parse(&format!("https://{}.dfs.core.windows.net", config.account))
                .map_err(|err| {
                    CloudError::Config(format!(
                        "invalid storage account name {}: {err}",
                        config.account
                    ))
                })?,
        };
        let http = Client::builder().timeout(METADATA_TIMEOUT).build()?;
        Ok(Self {
            http,
            credential,
            endpoint,
            container: config.container.clone(),
        })
    }

    /// Creates the object, appends the payload and flushes it in one go.
    /// An empty payload still produces a zero-length object.
    pub async fn upload(
        &self,
        target: &IngestTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let url = self.object_url(target, file_name)?;
        let size = bytes.len() as u64;

        let create = vec![("resource".to_string(), "file".to_string())];
        let response = self
            .send_signed(Method::PUT, url.clone(), &create, Vec::new(), "", UPLOAD_TIMEOUT)
            .await?;
        ensure_success("file create", response).await?;

        // A failed append or flush leaves a zero-length path behind
        // that the listings would count; remove it and report the
        // original error.
        if let Err(err) = self.write_and_flush(url.clone(), bytes).await {
            self.discard(url).await;
            return Err(err);
        }

        log::info!(
            "uploaded {} ({} bytes)",
            target.object_path(file_name),
            size
        );
        Ok(())
    }

    async fn write_and_flush(&self, url: Url, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len() as u64;
        if size > 0 {
            let append = vec![
                ("action".to_string(), "append".to_string()),
                ("position".to_string(), "0".to_string()),
            ];
            let response = self
                .send_signed(
                    Method::PATCH,
                    url.clone(),
                    &append,
                    bytes,
                    "application/octet-stream",
                    UPLOAD_TIMEOUT,
                )
                .await?;
            ensure_success("file append", response).await?;
        }

        let flush = vec![
            ("action".to_string(), "flush".to_string()),
            ("position".to_string(), size.to_string()),
        ];
        let response = self
            .send_signed(Method::PATCH, url, &flush, Vec::new(), "", UPLOAD_TIMEOUT)
            .await?;
        ensure_success("file flush", response).await?;
        Ok(())
    }

    /// Best-effort removal of a half-written path.
    async fn discard(&self, url: Url) {
        let query = Vec::new();
        match self
            .send_signed(Method::DELETE, url.clone(), &query, Vec::new(), "", METADATA_TIMEOUT)
            .await
        {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => log::warn!(
                "could not discard {}: status {}",
                url.path(),
                response.status()
            ),
            Err(err) => log::warn!("could not discard {}: {err}", url.path()),
        }
    }

    /// Lists every path under `{database}/{table}/`, following
    /// continuation tokens. A prefix nobody has written to yet is an
    /// empty listing, not an error.
    pub async fn list_prefix(&self, target: &IngestTarget) -> Result<Vec<PathEntry>> {
        let url = self.filesystem_url()?;
        let directory = format!("{}/{}", target.database, target.table);
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut query = vec![
                ("directory".to_string(), directory.clone()),
                ("recursive".to_string(), "true".to_string()),
                ("resource".to_string(), "filesystem".to_string()),
            ];
            if let Some(token) = &continuation {
                query.push(("continuation".to_string(), token.clone()));
            }
            query.sort();

            let response = self
                .send_signed(Method::GET, url.clone(), &query, Vec::new(), "", METADATA_TIMEOUT)
                .await?;
            if !response.status().is_success() {
                let failure = read_failure(response).await;
                if failure.status == StatusCode::NOT_FOUND
                    && failure.code.as_deref() == Some("PathNotFound")
                {
                    return Ok(Vec::new());
                }
                return Err(CloudError::Status {
                    service: "path listing",
                    status: failure.status.as_u16(),
                    message: failure.message,
                });
            }

            let token = response
                .headers()
                .get("x-ms-continuation")
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            let page: ListPathsResponse = response.json().await?;
            for raw in page.paths {
                entries.push(raw.into_entry()?);
            }

            match token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(entries)
    }

    pub async fn file_count(&self, target: &IngestTarget) -> Result<u64> {
        let entries = self.list_prefix(target).await?;
        Ok(entries.iter().filter(|entry| !entry.is_directory).count() as u64)
    }

    pub async fn total_data_ingested(&self, target: &IngestTarget) -> Result<u64> {
        let entries = self.list_prefix(target).await?;
        Ok(entries
            .iter()
            .filter(|entry| !entry.is_directory)
            .map(|entry| entry.content_length)
            .sum())
    }

    fn object_url(&self, target: &IngestTarget, file_name: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CloudError::Config("storage endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&self.container)
            .push(&target.database)
            .push(&target.table)
            .push(file_name);
        Ok(url)
    }

    fn filesystem_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CloudError::Config("storage endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&self.container);
        Ok(url)
    }

    async fn send_signed(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Vec<u8>,
        content_type: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let canonical = CanonicalRequest {
            verb: method.as_str(),
            content_length: body.len() as u64,
            content_type,
            date: &date,
            version: STORAGE_API_VERSION,
            path: url.path(),
            query,
        };
        let authorization = self.credential.authorization(&canonical)?;

        let mut builder = self
            .http
            .request(method, url)
            .query(query)
            .timeout(timeout)
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", authorization);
        if !content_type.is_empty() {
            builder = builder.header("Content-Type", content_type);
        }
        Ok(builder.body(body).send().await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub name: String,
    pub content_length: u64,
    pub is_directory: bool,
}

#[derive(Debug, Deserialize)]
struct ListPathsResponse {
    #[serde(default)]
    paths: Vec<RawPathEntry>,
}

// The dfs listing serializes contentLength and isDirectory as JSON
// strings in some service versions and as native values in others.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPathEntry {
    name: String,
    #[serde(default)]
    content_length: Option<LaxU64>,
    #[serde(default)]
    is_directory: Option<LaxBool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LaxU64 {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LaxBool {
    Bool(bool),
    Text(String),
}

impl RawPathEntry {
    fn into_entry(self) -> Result<PathEntry> {
        let content_length = match &self.content_length {
            None => 0,
            Some(LaxU64::Number(value)) => *value,
            Some(LaxU64::Text(text)) => text.parse().map_err(|_| {
                CloudError::UnexpectedResponse(format!(
                    "bad contentLength {text:?} for {}",
                    self.name
                ))
            })?,
        };
        let is_directory = match &self.is_directory {
            None => false,
            Some(LaxBool::Bool(value)) => *value,
            Some(LaxBool::Text(text)) => text.eq_ignore_ascii_case("true"),
        };
        Ok(PathEntry {
            name: self.name,
            content_length,
            is_directory,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    error: StorageErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StorageErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
}

struct StorageFailure {
    status: StatusCode,
    code: Option<String>,
    message: String,
}

async fn read_failure(response: Response) -> StorageFailure {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<StorageErrorBody>(&text) {
        Ok(body) => {
            let message = if body.error.message.is_empty() {
                body.error.code.clone()
            } else {
                format!("{}: {}", body.error.code, body.error.message)
            };
            StorageFailure {
                status,
                code: Some(body.error.code),
                message,
            }
        }
        Err(_) => StorageFailure {
            status,
            code: None,
            message: if text.is_empty() {
                status.to_string()
            } else {
                text
            },
        },
    }
}

async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let failure = read_failure(response).await;
    Err(CloudError::Status {
        service,
        status: failure.status.as_u16(),
        message: failure.message,
    })
}
