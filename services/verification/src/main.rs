use std::sync::Arc;

use tracing::info;

use welfare_core::clock::SystemClock;
use welfare_core::config::Config;
use welfare_core::health::Readiness;
use welfare_core::tracing::init_tracing;
use welfare_verification::config::VerificationConfig;
use welfare_verification::infra::account::HttpAccountRepository;
use welfare_verification::infra::ttl_store::SWEEP_INTERVAL;
use welfare_verification::router::build_router;
use welfare_verification::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = VerificationConfig::from_env();

    let accounts = HttpAccountRepository::new(&config.accounts_base_url)
        .expect("failed to build users service client");

    let state = AppState::new(&config, Arc::new(SystemClock), accounts);
    let code_sweeper = state.codes.spawn_sweeper(SWEEP_INTERVAL);
    let step_up_sweeper = state.step_up.spawn_sweeper(SWEEP_INTERVAL);
    let readiness = state.readiness.clone();

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.verification_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("verification service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(readiness))
        .await
        .expect("server error");

    code_sweeper.shutdown().await;
    step_up_sweeper.shutdown().await;
    info!("verification service stopped");
}

async fn shutdown_signal(readiness: Readiness) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    readiness.mark_draining();
    info!("shutdown signal received, draining");
}
