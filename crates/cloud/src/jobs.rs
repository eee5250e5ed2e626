use std::time::Duration;

use portal_core::JobRunRequest;
use reqwest::{Client, Url};

use crate::error::{CloudError, Result};

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub instance_url: String,
    pub token: String,
}

/// Client for the job scheduler's one-time run submission endpoint.
#[derive(Clone)]
pub struct JobSchedulerClient {
    http: Client,
    instance: Url,
    token: String,
}

impl JobSchedulerClient {
    pub fn new(config: &JobsConfig) -> Result<Self> {
        let instance = Url::parse(&config.instance_url).map_err(|err| {
            CloudError::Config(format!(
                "invalid scheduler instance url {}: {err}",
                config.instance_url
            ))
        })?;
        let http = Client::builder().timeout(SUBMIT_TIMEOUT).build()?;
        Ok(Self {
            http,
            instance,
            token: config.token.clone(),
        })
    }

    /// Submits a one-time run and returns the scheduler's response body.
    /// Rejections surface with the response's status text.
    pub async fn submit(&self, request: &JobRunRequest) -> Result<serde_json::Value> {
        let mut url = self.instance.clone();
        url.path_segments_mut()
            .map_err(|_| CloudError::Config("scheduler instance url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "2.1", "jobs", "runs", "submit"]);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            if !detail.is_empty() {
                log::debug!("scheduler rejected run submit: {detail}");
            }
            return Err(CloudError::Status {
                service: "job submit",
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        log::info!("submitted run {}", request.run_name);
        Ok(response.json().await?)
    }
}
