pub mod cost;
pub mod error;
pub mod jobs;
pub mod shared_key;
pub mod storage;

pub use cost::{CostClient, CostConfig, cost_window};
pub use error::{CloudError, Result};
pub use jobs::{JobSchedulerClient, JobsConfig};
pub use shared_key::{CanonicalRequest, SharedKeyCredential};
pub use storage::{DataLakeClient, PathEntry, StorageConfig};
