pub mod config;
pub mod error;
pub mod services;

pub use config::{ConfigError, PortalConfig, ServerConfig};
pub use error::{ApiError, AppError, Result};
pub use services::{AppServices, CostService, JobsService, StorageService};
