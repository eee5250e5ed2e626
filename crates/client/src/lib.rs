pub mod api;
pub mod batch;
pub mod notify;

pub use api::{DEFAULT_NOTEBOOK_PATH, JobSettings, PortalApiError, PortalClient};
pub use batch::{BatchReport, FileUploadRecord, Phase, SelectedFile, UploadOrchestrator};
pub use notify::NotificationCenter;
