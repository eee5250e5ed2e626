use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use portal_core::JobRunRequest;

use crate::{errors::HttpError, state::HttpState};

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub table: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileCountBody {
    file_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TotalDataBody {
    total_size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CostBody {
    total_cost: f64,
    currency: String,
    timeframe: String,
}

#[derive(Debug, Serialize)]
struct JobAccepted {
    message: &'static str,
    data: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct JobRejected {
    error: String,
    details: String,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn upload(
    State(state): State<HttpState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let mut database: Option<String> = None;
    let mut table: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    // The first occurrence of each field wins; repeats are ignored.
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if file.is_none() => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if let Some(file_name) = file_name {
                    file = Some((file_name, bytes.to_vec()));
                }
            }
            Some("database") if database.is_none() => {
                database = Some(field.text().await.map_err(bad_multipart)?);
            }
            Some("table") if table.is_none() => {
                table = Some(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(HttpError::bad_request("Missing required fields"));
    };

    state
        .services
        .storage
        .upload_file(
            database.as_deref().unwrap_or_default(),
            table.as_deref().unwrap_or_default(),
            &file_name,
            bytes,
        )
        .await?;
    Ok(Json(MessageBody {
        message: "File uploaded successfully",
    }))
}

pub async fn file_count(
    State(state): State<HttpState>,
    Query(query): Query<TargetQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let count = state
        .services
        .storage
        .file_count(&query.database, &query.table)
        .await?;
    Ok(Json(FileCountBody { file_count: count }))
}

pub async fn total_data(
    State(state): State<HttpState>,
    Query(query): Query<TargetQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let total = state
        .services
        .storage
        .total_data_ingested(&query.database, &query.table)
        .await?;
    Ok(Json(TotalDataBody { total_size: total }))
}

pub async fn cost(State(state): State<HttpState>) -> Result<impl IntoResponse, HttpError> {
    let report = state.services.cost.current().await?;
    Ok(Json(CostBody {
        total_cost: report.total_cost,
        currency: report.currency,
        timeframe: report.timeframe,
    }))
}

// The scheduler route answers with its own body shapes: `{message, data}`
// on success and `{error, details}` on failure.
pub async fn submit_job(
    State(state): State<HttpState>,
    Json(request): Json<JobRunRequest>,
) -> Response {
    match state.services.jobs.submit_run(&request).await {
        Ok(data) => (
            StatusCode::OK,
            Json(JobAccepted {
                message: "Job submitted successfully",
                data,
            }),
        )
            .into_response(),
        Err(err) => {
            let api = portal_app::ApiError::from(err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JobRejected {
                    error: api.message,
                    details: api.error.unwrap_or_default(),
                }),
            )
                .into_response()
        }
    }
}

fn bad_multipart(err: MultipartError) -> HttpError {
    HttpError::bad_request("invalid multipart body").with_detail(err.to_string())
}
