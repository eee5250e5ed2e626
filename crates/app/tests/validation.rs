use std::collections::HashMap;

use portal_app::{AppError, AppServices, PortalConfig};

// Endpoints point at a closed local port so any request that slipped
// past validation would fail as a transport error, not as the
// validation error the assertions expect.
fn services() -> AppServices {
    let env = HashMap::from([
        ("AZURE_STORAGE_ACCOUNT_NAME", "acct"),
        ("AZURE_STORAGE_ACCOUNT_KEY", "c2VjcmV0LWtleQ=="),
        ("AZURE_STORAGE_CONTAINER_NAME", "raw"),
        ("AZURE_STORAGE_ENDPOINT", "http://127.0.0.1:9"),
        ("AZURE_TENANT_ID", "tenant-1"),
        ("AZURE_CLIENT_ID", "client-1"),
        ("AZURE_CLIENT_SECRET", "secret-1"),
        ("AZURE_SUBSCRIPTION_ID", "sub-1"),
        ("AZURE_RESOURCE_GROUP_NAME", "rg-1"),
        ("AZURE_MANAGEMENT_ENDPOINT", "http://127.0.0.1:9"),
        ("AZURE_LOGIN_ENDPOINT", "http://127.0.0.1:9"),
        ("DATABRICKS_INSTANCE", "http://127.0.0.1:9"),
        ("DATABRICKS_TOKEN", "dbx-token"),
    ]);
    let config = PortalConfig::from_lookup(|name| env.get(name).map(|value| value.to_string()))
        .expect("config parses");
    AppServices::new(&config).expect("services build")
}

fn invalid_input(err: AppError) -> String {
    match err {
        AppError::InvalidInput(message) => message,
        other => panic!("expected invalid input, got {other}"),
    }
}

#[tokio::test]
async fn upload_requires_database_table_and_file_name() {
    let services = services();
    for (database, table, file_name) in [
        ("", "orders", "a.txt"),
        ("sales", "", "a.txt"),
        ("sales", "orders", ""),
    ] {
        let err = services
            .storage
            .upload_file(database, table, file_name, b"x".to_vec())
            .await
            .unwrap_err();
        assert_eq!(invalid_input(err), "Missing required fields");
    }
}

#[tokio::test]
async fn upload_rejects_non_txt_files() {
    let services = services();
    let err = services
        .storage
        .upload_file("sales", "orders", "a.parquet", b"x".to_vec())
        .await
        .unwrap_err();
    assert_eq!(invalid_input(err), "File must be a TXT");
}

#[tokio::test]
async fn metric_lookups_require_the_target_parameters() {
    let services = services();
    let err = services.storage.file_count("", "orders").await.unwrap_err();
    assert_eq!(
        invalid_input(err),
        "Database and table parameters are required"
    );
    let err = services
        .storage
        .total_data_ingested("sales", "")
        .await
        .unwrap_err();
    assert_eq!(
        invalid_input(err),
        "Database and table parameters are required"
    );
}

#[tokio::test]
async fn upstream_failures_are_wrapped_with_the_route_message() {
    let services = services();
    let err = services
        .storage
        .upload_file("sales", "orders", "a.txt", b"x".to_vec())
        .await
        .unwrap_err();
    match err {
        AppError::Operation { message, .. } => assert_eq!(message, "Error uploading file"),
        other => panic!("expected wrapped operation error, got {other}"),
    }
}
