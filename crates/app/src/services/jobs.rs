use portal_cloud::JobSchedulerClient;
use portal_core::JobRunRequest;

use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct JobsService {
    client: JobSchedulerClient,
}

impl JobsService {
    pub(super) fn new(client: JobSchedulerClient) -> Self {
        Self { client }
    }

    /// Forwards the run to the scheduler and returns its response body
    /// untouched so the route can echo it back.
    pub async fn submit_run(&self, request: &JobRunRequest) -> Result<serde_json::Value> {
        self.client
            .submit(request)
            .await
            .map_err(|err| AppError::operation("Failed to submit job", err))
    }
}
