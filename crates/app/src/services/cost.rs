use portal_cloud::CostClient;
use portal_core::CostReport;

use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct CostService {
    client: CostClient,
}

impl CostService {
    pub(super) fn new(client: CostClient) -> Self {
        Self { client }
    }

    /// Point-in-time spend for the trailing 30-day window. An upstream
    /// answer with no rows is reported the same way as any other
    /// failure of the query.
    pub async fn current(&self) -> Result<CostReport> {
        self.client
            .current_cost()
            .await
            .map_err(|err| AppError::operation("Error fetching cost data", err))
    }
}
