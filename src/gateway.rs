//! HTTP entrypoint for Twilio webhooks.
//!
//! `POST <webhookPath>` relays one notification and always answers 200 with a
//! plain text body. `GET /health` reports liveness.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::config::Config;
use crate::mattermost::{MattermostClient, MessagingApi};
use crate::relay::{self, Destination, RelayContext};
use crate::utils::http::build_http_client;

/// Build the router around an activated relay context.
pub fn build_router(ctx: Arc<RelayContext>, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(ctx)
}

/// POST <webhookPath>: relay one Twilio notification.
async fn webhook_handler(State(ctx): State<Arc<RelayContext>>, body: Bytes) -> Response {
    let outcome = relay::on_request(&ctx, &body).await;
    (
        outcome.status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        outcome.body,
    )
        .into_response()
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Provision the bot and build the shared relay context.
pub async fn activate(config: &Config) -> Result<RelayContext> {
    let api: Arc<dyn MessagingApi> = Arc::new(MattermostClient::new(&config.mattermost));
    let bot = relay::on_activate(api.as_ref(), &config.bot).await?;
    Ok(RelayContext::new(
        api,
        build_http_client(config.media.timeout()),
        bot,
        Destination::from_config(&config.mattermost),
        config.media.clone(),
    ))
}

/// Bind and start serving. Returns the server task and the bound address.
pub async fn start(
    ctx: Arc<RelayContext>,
    host: &str,
    port: u16,
    webhook_path: &str,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr)> {
    let app = build_router(ctx, webhook_path);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local = listener.local_addr()?;
    info!("twilio webhook listening on {}{}", local, webhook_path);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("webhook server error: {}", e);
        }
    });

    Ok((handle, local))
}

/// Activate, serve, and run until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let ctx = Arc::new(activate(config).await?);
    info!(
        "relaying into {}/{} as @{}",
        ctx.destination().team,
        ctx.destination().channel,
        ctx.bot().username
    );

    let (handle, _) = start(
        ctx,
        &config.server.host,
        config.server.port,
        &config.server.webhook_path,
    )
    .await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutting down webhook server");
    handle.abort();
    Ok(())
}
