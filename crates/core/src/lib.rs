use serde::{Deserialize, Serialize};

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Normal,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub succeeded: bool,
    pub byte_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn success(byte_size: u64) -> Self {
        Self {
            succeeded: true,
            byte_size,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            byte_size: 0,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestTarget {
    pub database: String,
    pub table: String,
}

impl IngestTarget {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.database.is_empty() && !self.table.is_empty()
    }

    pub fn prefix(&self) -> String {
        format!("{}/{}/", self.database, self.table)
    }

    pub fn object_path(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.database, self.table, file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub total_cost: f64,
    pub currency: String,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub file_count: u64,
    pub total_bytes: u64,
    pub cost: f64,
    pub currency: String,
    pub cost_timeframe: String,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            file_count: 0,
            total_bytes: 0,
            cost: 0.0,
            currency: "USD".to_string(),
            cost_timeframe: String::new(),
        }
    }
}

impl SessionMetrics {
    pub fn add_uploaded_bytes(&mut self, bytes: u64) {
        self.total_bytes = self.total_bytes.saturating_add(bytes);
    }

    pub fn apply_cost(&mut self, report: &CostReport) {
        self.cost = report.total_cost;
        self.currency = report.currency.clone();
        self.cost_timeframe = report.timeframe.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookParameters {
    pub database_name: String,
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookTask {
    pub notebook_path: String,
    pub base_parameters: NotebookParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTask {
    pub task_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub notebook_task: NotebookTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAs {
    pub service_principal_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunRequest {
    pub run_name: String,
    pub tasks: Vec<JobTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as: Option<RunAs>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub run_id: Option<i64>,
}

pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
