use std::io;
use std::path::Path;

use portal_core::{IngestTarget, JobHandle, Severity, SessionMetrics, bytes_to_megabytes};

use crate::api::PortalClient;
use crate::notify::NotificationCenter;

/// What the orchestrator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Refreshing,
}

/// A file picked for upload, held in memory alongside its name.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "path has no usable file name")
            })?;
        Ok(Self { file_name, bytes })
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Per-file result of one batch, including the overall progress the
/// batch had reached once this file was handled.
#[derive(Debug, Clone)]
pub struct FileUploadRecord {
    pub file_name: String,
    pub byte_size: u64,
    pub progress_percent: f64,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileUploadRecord>,
    pub files_uploaded: usize,
    pub files_failed: usize,
    pub bytes_uploaded: u64,
    pub job: Option<JobHandle>,
}

/// Drives a whole ingestion round: upload every selected file in order,
/// fold the outcomes into the session metrics, then refresh the lake
/// metrics, submit the ingestion job and refresh the cost figure. Every
/// step reports through the notification queue and a failed step never
/// stops the steps after it.
#[derive(Debug)]
pub struct UploadOrchestrator {
    client: PortalClient,
    pub notifications: NotificationCenter,
    pub metrics: SessionMetrics,
    phase: Phase,
    progress_percent: f64,
}

impl UploadOrchestrator {
    pub fn new(client: PortalClient) -> Self {
        Self {
            client,
            notifications: NotificationCenter::new(),
            metrics: SessionMetrics::default(),
            phase: Phase::Idle,
            progress_percent: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Overall progress of the most recent batch, 0 to 100. Only
    /// successful uploads advance it.
    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub async fn run_batch(
        &mut self,
        files: Vec<SelectedFile>,
        target: &IngestTarget,
        run_name: &str,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        if !target.is_complete() {
            self.notifications.notify(
                "Missing Information",
                "Please provide the database and table names.",
                Severity::Error,
            );
            return report;
        }

        self.phase = Phase::Uploading;
        self.progress_percent = 0.0;
        let total = files.len();
        let mut uploaded_bytes: u64 = 0;

        for file in &files {
            let outcome = self.client.upload(file, target).await;
            if outcome.succeeded {
                uploaded_bytes += outcome.byte_size;
                self.progress_percent += 100.0 / total as f64;
                self.notifications.notify(
                    "File Uploaded",
                    format!(
                        "{} was uploaded successfully to {}.{}.",
                        file.file_name, target.database, target.table
                    ),
                    Severity::Normal,
                );
                report.files.push(FileUploadRecord {
                    file_name: file.file_name.clone(),
                    byte_size: outcome.byte_size,
                    progress_percent: self.progress_percent,
                    error: None,
                });
                report.files_uploaded += 1;
                report.bytes_uploaded += outcome.byte_size;
            } else {
                let message = outcome
                    .error
                    .unwrap_or_else(|| "upload failed".to_string());
                log::warn!("upload of {} failed: {message}", file.file_name);
                self.notifications.notify(
                    "Upload Failed",
                    format!("Failed to upload {}: {message}", file.file_name),
                    Severity::Error,
                );
                report.files.push(FileUploadRecord {
                    file_name: file.file_name.clone(),
                    byte_size: 0,
                    progress_percent: self.progress_percent,
                    error: Some(message),
                });
                report.files_failed += 1;
            }
        }

        // Count what this batch moved before the lake-wide refresh, so
        // the session total is right even if the refresh fails.
        self.metrics.add_uploaded_bytes(uploaded_bytes);

        self.phase = Phase::Refreshing;
        self.refresh_file_count(target).await;
        self.refresh_total_data(target).await;
        report.job = self.submit_job(run_name, target).await;
        self.refresh_cost().await;
        self.phase = Phase::Idle;

        report
    }

    async fn refresh_file_count(&mut self, target: &IngestTarget) {
        match self.client.file_count(target).await {
            Ok(count) => {
                self.metrics.file_count = count;
                self.notifications.notify(
                    "File Count Updated",
                    format!(
                        "{count} files under {}.{}.",
                        target.database, target.table
                    ),
                    Severity::Normal,
                );
            }
            Err(err) => {
                self.notifications.notify(
                    "File Count Update Failed",
                    format!("Could not fetch the latest file count: {err}"),
                    Severity::Error,
                );
            }
        }
    }

    async fn refresh_total_data(&mut self, target: &IngestTarget) {
        match self.client.total_data_ingested(target).await {
            Ok(total) => {
                self.metrics.total_bytes = total;
                self.notifications.notify(
                    "Data Ingested Updated",
                    format!("Total data ingested: {:.2} MB", bytes_to_megabytes(total)),
                    Severity::Normal,
                );
            }
            Err(err) => {
                self.notifications.notify(
                    "Data Ingested Update Failed",
                    format!("Could not fetch the total data ingested: {err}"),
                    Severity::Error,
                );
            }
        }
    }

    async fn submit_job(&mut self, run_name: &str, target: &IngestTarget) -> Option<JobHandle> {
        match self.client.submit_job(run_name, target).await {
            Ok(handle) => {
                self.notifications.notify(
                    "Job Submitted",
                    "The ingestion job was submitted successfully.",
                    Severity::Normal,
                );
                Some(handle)
            }
            Err(err) => {
                self.notifications.notify(
                    "Job Submission Failed",
                    format!("Could not submit the ingestion job: {err}"),
                    Severity::Error,
                );
                None
            }
        }
    }

    async fn refresh_cost(&mut self) {
        match self.client.cost().await {
            Ok(cost) => {
                self.notifications.notify(
                    "Cost Updated",
                    format!(
                        "Total cost for {}: {} {}",
                        cost.timeframe, cost.total_cost, cost.currency
                    ),
                    Severity::Normal,
                );
                self.metrics.apply_cost(&cost);
            }
            Err(err) => {
                self.notifications.notify(
                    "Cost Update Failed",
                    format!("Could not fetch the latest cost information: {err}"),
                    Severity::Error,
                );
            }
        }
    }
}
