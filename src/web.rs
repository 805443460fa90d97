//! Browser host for the viewer.
//!
//! One [`ViewerState`] per process. Browser events arrive as form posts,
//! are applied as transitions under a lock, and the browser is redirected
//! back to the rendered page.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::client::{CaptionService, HttpCaptionClient, FILE_FIELD};
use crate::config::ViewerConfig;
use crate::file::SelectedFile;
use crate::preview::PreviewStore;
use crate::render;
use crate::state::ViewerState;

pub struct AppState {
    viewer: Mutex<ViewerState>,
    /// Bumped on teardown; completions from an older epoch are discarded.
    epoch: AtomicU64,
    previews: PreviewStore,
    service: Arc<dyn CaptionService>,
}

impl AppState {
    pub fn new(service: Arc<dyn CaptionService>) -> Arc<Self> {
        Arc::new(Self {
            viewer: Mutex::new(ViewerState::new()),
            epoch: AtomicU64::new(0),
            previews: PreviewStore::new(),
            service,
        })
    }

    /// Locks the viewer for inspection.
    pub async fn viewer(&self) -> MutexGuard<'_, ViewerState> {
        self.viewer.lock().await
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Resets the viewer, releasing its preview.
    pub async fn teardown(&self) {
        let mut viewer = self.viewer.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        drop(std::mem::take(&mut *viewer));
        tracing::debug!(live_previews = self.previews.len(), "viewer torn down");
    }
}

pub fn router(app: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/pick", post(pick))
        .route("/submit", post(submit))
        .route("/preview/:key", get(preview))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(app)
}

/// Runs the viewer until Ctrl-C.
pub async fn serve(config: &ViewerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let service: Arc<dyn CaptionService> = Arc::new(HttpCaptionClient::new(config));
    let app = AppState::new(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, endpoint = %config.endpoint_url, "viewer listening");

    axum::serve(listener, router(Arc::clone(&app), config.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app.teardown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}

async fn index(State(app): State<Arc<AppState>>) -> Html<String> {
    let viewer = app.viewer.lock().await;
    Html(render::render_page(&viewer))
}

/// A form that cannot be read (malformed, or over the body limit) counts as
/// an invalid pick, so the user lands back on the page with the error banner.
async fn pick(
    State(app): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Redirect {
    let file = match multipart {
        Ok(mut multipart) => match read_file_field(&mut multipart).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(status = %e.status(), error = %e, "unreadable upload form");
                None
            }
        },
        Err(e) => {
            tracing::warn!(status = %e.status(), error = %e, "rejected upload form");
            None
        }
    };

    let mut viewer = app.viewer.lock().await;
    *viewer = std::mem::take(&mut *viewer).on_file_picked(file, &app.previews);
    Redirect::to("/")
}

/// Reads the `file` part. An absent part or empty filename means no file was chosen.
async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<SelectedFile>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        if name.is_empty() {
            return Ok(None);
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(SelectedFile::new(name, content_type, bytes)));
    }
    Ok(None)
}

async fn submit(State(app): State<Arc<AppState>>) -> Redirect {
    let (request, epoch) = {
        let mut viewer = app.viewer.lock().await;
        let (next, request) = std::mem::take(&mut *viewer).on_submit();
        *viewer = next;
        (request, app.epoch.load(Ordering::SeqCst))
    };

    if let Some(request) = request {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let outcome = app.service.upload(request).await;
            let mut viewer = app.viewer.lock().await;
            if app.epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!("discarding response for a torn-down viewer");
                return;
            }
            *viewer = std::mem::take(&mut *viewer).on_upload_complete(outcome);
        });
    }

    Redirect::to("/")
}

async fn preview(State(app): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    match app.previews.get(&key) {
        Some((content_type, bytes)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
