mod cost;
mod jobs;
mod storage;

use crate::config::PortalConfig;
use crate::error::Result;
use portal_cloud::{CostClient, DataLakeClient, JobSchedulerClient};

pub use cost::CostService;
pub use jobs::JobsService;
pub use storage::StorageService;

/// Service registry for portal operations.
#[derive(Clone)]
pub struct AppServices {
    pub storage: StorageService,
    pub cost: CostService,
    pub jobs: JobsService,
}

impl AppServices {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        Ok(Self {
            storage: StorageService::new(DataLakeClient::new(&config.storage)?),
            cost: CostService::new(CostClient::new(&config.cost)?),
            jobs: JobsService::new(JobSchedulerClient::new(&config.jobs)?),
        })
    }
}
