//! `operator serve`

use crate::commands::cli::ServeArgs;
use crate::http::{server, AppState};
use operator_core::api::{AppContext, CliError, ServicesFactory};
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

pub async fn handle_serve(
    args: ServeArgs,
    ctx: &AppContext,
    factory: &dyn ServicesFactory,
) -> Result<(), CliError> {
    let session_id = args
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // CLI flags win over config
    let host = args.host.unwrap_or_else(|| ctx.cfg().server.host.clone());
    let port = args.port.unwrap_or(ctx.cfg().server.port);

    let services = factory.build_services(ctx.cfg())?;
    let startup_health = services.classifier.health().await;
    info!(
        llm_status = %startup_health.llm_status,
        model = ?startup_health.model,
        fallback_used = startup_health.fallback_used,
        message = %startup_health.llm_message,
        "language model status at startup"
    );

    let classifier = services.classifier.clone();
    let (gateway, approvals) = ctx.wire(&services);
    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(session_id.clone(), gateway, approvals, classifier, shutdown_tx);

    let config = server::ServerConfig {
        host,
        port,
        command_timeout: ctx.command_timeout(),
        state_dir: None,
    };
    server::start_server_with_config(session_id, config, state)
        .await
        .map_err(|e| CliError::Server(format!("{e:#}")))
}
