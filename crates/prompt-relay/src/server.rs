//! Actix Web HTTP server.
//!
//! Exposes:
//! - `POST /api/generate`
//! - `GET /health`

use crate::{
    config::{RelayConfig, RelayMode},
    error::RelayError,
    streaming,
    types::PromptRequest,
    upstream::GeminiClient,
};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

pub struct AppState {
    pub mode: RelayMode,
    pub upstream: GeminiClient,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            mode: config.mode,
            upstream: GeminiClient::new(config)?,
        })
    }
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let addr = config.bind_addr();
    let state = web::Data::new(AppState::new(&config).context("failed to build upstream client")?);

    info!(addr = %addr, mode = %config.mode, model = %config.model, "prompt-relay listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .configure(routes)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}

/// Route table. Expects `web::Data<AppState>` to be registered on the app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "rejected unreadable request body");
        RelayError::InvalidPrompt.into()
    }))
    .route("/health", web::get().to(health_check))
    .route("/api/generate", web::post().to(handle_generate));
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handle_generate(
    state: web::Data<AppState>,
    body: web::Json<PromptRequest>,
) -> Result<HttpResponse, RelayError> {
    let prompt = body
        .into_inner()
        .into_prompt()
        .inspect_err(|_| warn!("rejected request without prompt"))?;

    info!(
        mode = %state.mode,
        model = %state.upstream.model(),
        prompt_len = prompt.len(),
        "relaying prompt"
    );

    let result = match state.mode {
        RelayMode::Buffered => relay_buffered(&state.upstream, &prompt).await,
        RelayMode::Streaming => relay_streaming(&state.upstream, &prompt).await,
        RelayMode::Passthrough => relay_passthrough(&state.upstream, &prompt).await,
    };

    result.inspect_err(|e| error!(error = %e, "upstream call failed"))
}

async fn relay_buffered(upstream: &GeminiClient, prompt: &str) -> Result<HttpResponse, RelayError> {
    let document = upstream.generate(prompt).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(document))
}

async fn relay_streaming(
    upstream: &GeminiClient,
    prompt: &str,
) -> Result<HttpResponse, RelayError> {
    let response = upstream.stream_generate(prompt).await?;
    let fragments =
        streaming::prime(Box::pin(streaming::text_fragments(response.bytes_stream()))).await?;
    Ok(text_stream(fragments.map(|r| r.map(Bytes::from))))
}

async fn relay_passthrough(
    upstream: &GeminiClient,
    prompt: &str,
) -> Result<HttpResponse, RelayError> {
    let response = upstream.stream_generate(prompt).await?;
    let body = streaming::prime(Box::pin(streaming::passthrough(response.bytes_stream()))).await?;
    Ok(text_stream(body))
}

/// Chunked `text/plain` response. An error after headers are sent aborts the
/// connection without the terminating chunk.
fn text_stream<S>(body: S) -> HttpResponse
where
    S: Stream<Item = Result<Bytes, RelayError>> + 'static,
{
    let body =
        body.map(|r| r.inspect_err(|e| error!(error = %e, "upstream stream failed mid-response")));

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(("cache-control", "no-cache"))
        .streaming(body)
}
