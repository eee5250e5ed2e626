use http_api::HttpState;
use portal_app::{AppServices, PortalConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    let services = match AppServices::new(&config) {
        Ok(services) => services,
        Err(err) => {
            eprintln!("failed to initialize cloud clients: {}", err);
            std::process::exit(1);
        }
    };
    let state = HttpState::new(services, config.server.max_upload_bytes);
    let app = http_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .expect("bind server");
    println!(
        "Ingestion portal is running at http://{}",
        config.server.listen_addr
    );
    println!("Press Ctrl+C to stop.");
    log::info!("listening on {}", config.server.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("serve");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
