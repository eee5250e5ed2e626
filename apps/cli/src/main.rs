mod args;
mod config;

use std::process::ExitCode;

use portal_client::{JobSettings, PortalClient, SelectedFile, UploadOrchestrator};
use portal_core::{IngestTarget, Severity, bytes_to_megabytes};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = match args::parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            args::print_help();
            return ExitCode::FAILURE;
        }
    };

    let config = match config::load_or_create() {
        Ok(load) => load,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if config.created {
        println!("Created config at {}.", config.file.display());
    }

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match SelectedFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(err) => {
                eprintln!("cannot read {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let server_url = args
        .server
        .unwrap_or_else(|| config.config.server_url.clone());
    let run_name = args.run_name.unwrap_or_else(|| config.config.run_name.clone());

    let mut settings = JobSettings::default();
    if let Some(path) = config.config.notebook_path.clone() {
        settings.notebook_path = path;
    }
    settings.service_principal = config.config.service_principal.clone();

    let client = match PortalClient::new(&server_url) {
        Ok(client) => client.with_job_settings(settings),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let target = IngestTarget::new(args.database, args.table);
    let mut portal = UploadOrchestrator::new(client);
    let report = portal.run_batch(files, &target, &run_name).await;

    for note in portal.notifications.notifications() {
        match note.severity {
            Severity::Error => eprintln!("[error] {}: {}", note.title, note.body),
            Severity::Normal => println!("{}: {}", note.title, note.body),
        }
    }

    println!(
        "Uploaded {} of {} files ({:.2} MB this run).",
        report.files_uploaded,
        report.files_uploaded + report.files_failed,
        bytes_to_megabytes(report.bytes_uploaded)
    );
    println!(
        "Lake holds {} files, {:.2} MB total.",
        portal.metrics.file_count,
        bytes_to_megabytes(portal.metrics.total_bytes)
    );
    if !portal.metrics.cost_timeframe.is_empty() {
        println!(
            "Cost for {}: {} {}.",
            portal.metrics.cost_timeframe, portal.metrics.cost, portal.metrics.currency
        );
    }
    if let Some(run_id) = report.job.and_then(|job| job.run_id) {
        println!("Ingestion job run id: {run_id}");
    }

    if report.files_failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
