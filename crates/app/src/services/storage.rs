use portal_cloud::DataLakeClient;
use portal_core::IngestTarget;

use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct StorageService {
    client: DataLakeClient,
}

impl StorageService {
    pub(super) fn new(client: DataLakeClient) -> Self {
        Self { client }
    }

    /// Stores the payload under `{database}/{table}/{file_name}` and
    /// returns its size. Only `.txt` files are accepted; a zero-length
    /// payload still produces an object.
    pub async fn upload_file(
        &self,
        database: &str,
        table: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<u64> {
        if database.is_empty() || table.is_empty() || file_name.is_empty() {
            return Err(AppError::InvalidInput(
                "Missing required fields".to_string(),
            ));
        }
        if !file_name.ends_with(".txt") {
            return Err(AppError::InvalidInput("File must be a TXT".to_string()));
        }
        let target = IngestTarget::new(database, table);
        let size = bytes.len() as u64;
        self.client
            .upload(&target, file_name, bytes)
            .await
            .map_err(|err| AppError::operation("Error uploading file", err))?;
        Ok(size)
    }

    pub async fn file_count(&self, database: &str, table: &str) -> Result<u64> {
        let target = require_target(database, table)?;
        self.client
            .file_count(&target)
            .await
            .map_err(|err| AppError::operation("Error fetching file count", err))
    }

    pub async fn total_data_ingested(&self, database: &str, table: &str) -> Result<u64> {
        let target = require_target(database, table)?;
        self.client
            .total_data_ingested(&target)
            .await
            .map_err(|err| AppError::operation("Error fetching total data ingested", err))
    }
}

fn require_target(database: &str, table: &str) -> Result<IngestTarget> {
    if database.is_empty() || table.is_empty() {
        return Err(AppError::InvalidInput(
            "Database and table parameters are required".to_string(),
        ));
    }
    Ok(IngestTarget::new(database, table))
}
