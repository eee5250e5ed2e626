use portal_core::{
    CostReport, IngestTarget, JobHandle, JobRunRequest, JobTask, NotebookParameters, NotebookTask,
    RunAs, UploadOutcome,
};
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::batch::SelectedFile;

pub const DEFAULT_NOTEBOOK_PATH: &str = "/pipelines/file_ingestion";

const DEFAULT_TASK_KEY: &str = "ingest";
const DEFAULT_TASK_DESCRIPTION: &str = "File ingestion";

#[derive(Debug, thiserror::Error)]
pub enum PortalApiError {
    #[error("invalid portal url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("{context}: {detail}")]
    Api { context: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, PortalApiError>;

/// How a submitted ingestion run is described to the job scheduler.
/// Every field has a default so a bare client can still submit runs.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub notebook_path: String,
    pub task_key: String,
    pub description: Option<String>,
    pub service_principal: Option<String>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            notebook_path: DEFAULT_NOTEBOOK_PATH.to_string(),
            task_key: DEFAULT_TASK_KEY.to_string(),
            description: Some(DEFAULT_TASK_DESCRIPTION.to_string()),
            service_principal: None,
        }
    }
}

/// HTTP client for the portal backend.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: Client,
    base: Url,
    job_settings: JobSettings,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileCountBody {
    #[serde(rename = "fileCount")]
    file_count: u64,
}

#[derive(Debug, Deserialize)]
struct TotalDataBody {
    #[serde(rename = "totalSize")]
    total_size: u64,
}

#[derive(Debug, Deserialize)]
struct CostBody {
    #[serde(rename = "totalCost")]
    total_cost: f64,
    currency: String,
    timeframe: String,
}

#[derive(Debug, Deserialize)]
struct JobAcceptedBody {
    #[serde(default)]
    data: serde_json::Value,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|err| PortalApiError::InvalidUrl {
            url: base_url.to_string(),
            message: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(PortalApiError::InvalidUrl {
                url: base_url.to_string(),
                message: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            http: Client::new(),
            base,
            job_settings: JobSettings::default(),
        })
    }

    pub fn with_job_settings(mut self, settings: JobSettings) -> Self {
        self.job_settings = settings;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    /// Uploads one file into `{database}/{table}` on the lake. Failures
    /// are folded into the outcome instead of being returned as errors
    /// so one bad file never aborts the surrounding batch.
    pub async fn upload(&self, file: &SelectedFile, target: &IngestTarget) -> UploadOutcome {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone()),
            )
            .text("database", target.database.clone())
            .text("table", target.table.clone());

        let response = match self
            .http
            .post(self.endpoint(&["api", "upload"]))
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return UploadOutcome::failure(err.to_string()),
        };

        let status = response.status();
        if !is_json(&response) {
            return UploadOutcome::failure(format!(
                "unexpected response: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "upload failed".to_string());
            return UploadOutcome::failure(message);
        }
        match response.json::<serde_json::Value>().await {
            Ok(_) => UploadOutcome::success(file.byte_size()),
            Err(err) => UploadOutcome::failure(err.to_string()),
        }
    }

    pub async fn file_count(&self, target: &IngestTarget) -> Result<u64> {
        let response = self
            .http
            .get(self.endpoint(&["api", "file-count"]))
            .query(&[("database", &target.database), ("table", &target.table)])
            .send()
            .await
            .map_err(|err| api_error("failed to retrieve the file count", err))?;
        let body: FileCountBody = check(response, "failed to retrieve the file count").await?;
        Ok(body.file_count)
    }

    pub async fn total_data_ingested(&self, target: &IngestTarget) -> Result<u64> {
        let response = self
            .http
            .get(self.endpoint(&["api", "total-data"]))
            .query(&[("database", &target.database), ("table", &target.table)])
            .send()
            .await
            .map_err(|err| api_error("failed to retrieve the total data ingested", err))?;
        let body: TotalDataBody =
            check(response, "failed to retrieve the total data ingested").await?;
        Ok(body.total_size)
    }

    pub async fn cost(&self) -> Result<CostReport> {
        let response = self
            .http
            .get(self.endpoint(&["api", "cost"]))
            .send()
            .await
            .map_err(|err| api_error("failed to retrieve the cost data", err))?;
        let body: CostBody = check(response, "failed to retrieve the cost data").await?;
        Ok(CostReport {
            total_cost: body.total_cost,
            currency: body.currency,
            timeframe: body.timeframe,
        })
    }

    /// Submits the ingestion job for `target` and hands back whatever
    /// run id the scheduler assigned, if it reported one.
    pub async fn submit_job(&self, run_name: &str, target: &IngestTarget) -> Result<JobHandle> {
        let request = self.run_request(run_name, target);
        let response = self
            .http
            .post(self.endpoint(&["api", "submitJob"]))
            .json(&request)
            .send()
            .await
            .map_err(|err| api_error("failed to submit the ingestion job", err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalApiError::Api {
                context: "failed to submit the ingestion job",
                detail: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }
        let body = response
            .json::<JobAcceptedBody>()
            .await
            .map_err(|err| api_error("failed to submit the ingestion job", err))?;
        Ok(JobHandle {
            run_id: body.data.get("run_id").and_then(serde_json::Value::as_i64),
        })
    }

    fn run_request(&self, run_name: &str, target: &IngestTarget) -> JobRunRequest {
        JobRunRequest {
            run_name: run_name.to_string(),
            tasks: vec![JobTask {
                task_key: self.job_settings.task_key.clone(),
                description: self.job_settings.description.clone(),
                notebook_task: NotebookTask {
                    notebook_path: self.job_settings.notebook_path.clone(),
                    base_parameters: NotebookParameters {
                        database_name: target.database.clone(),
                        table_name: target.table.clone(),
                    },
                },
            }],
            run_as: self
                .job_settings
                .service_principal
                .clone()
                .map(|name| RunAs {
                    service_principal_name: name,
                }),
        }
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

fn api_error(context: &'static str, err: impl std::fmt::Display) -> PortalApiError {
    PortalApiError::Api {
        context,
        detail: err.to_string(),
    }
}

/// Turns an error response into the backend's `message` field when it
/// carries one, otherwise falls back to the bare status code.
async fn check<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("status {}", status.as_u16()));
        return Err(PortalApiError::Api { context, detail });
    }
    response.json::<T>().await.map_err(|err| api_error(context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_segments_onto_the_base() {
        let client = PortalClient::new("http://127.0.0.1:3030").expect("client");
        assert_eq!(
            client.endpoint(&["api", "file-count"]).as_str(),
            "http://127.0.0.1:3030/api/file-count"
        );
    }

    #[test]
    fn endpoint_tolerates_a_trailing_slash() {
        let client = PortalClient::new("http://portal.example.com/").expect("client");
        assert_eq!(
            client.endpoint(&["api", "upload"]).as_str(),
            "http://portal.example.com/api/upload"
        );
    }

    #[test]
    fn opaque_urls_are_rejected() {
        let err = PortalClient::new("mailto:ops@example.com").unwrap_err();
        assert!(matches!(err, PortalApiError::InvalidUrl { .. }));
    }

    #[test]
    fn run_request_carries_the_target_parameters() {
        let client = PortalClient::new("http://127.0.0.1:3030")
            .expect("client")
            .with_job_settings(JobSettings {
                service_principal: Some("sp-ingest".to_string()),
                ..JobSettings::default()
            });
        let target = IngestTarget::new("sales", "orders");
        let request = client.run_request("Nightly Ingestion", &target);

        assert_eq!(request.run_name, "Nightly Ingestion");
        assert_eq!(request.tasks.len(), 1);
        let task = &request.tasks[0];
        assert_eq!(task.task_key, "ingest");
        assert_eq!(task.notebook_task.notebook_path, DEFAULT_NOTEBOOK_PATH);
        assert_eq!(task.notebook_task.base_parameters.database_name, "sales");
        assert_eq!(task.notebook_task.base_parameters.table_name, "orders");
        assert_eq!(
            request.run_as.as_ref().map(|run_as| run_as.service_principal_name.as_str()),
            Some("sp-ingest")
        );
    }
}
