//! HTTP + WebSocket API for Essaymark
//!
//! Endpoints:
//! - POST /annotate - Resolve highlights, no reveal
//! - POST /view/new - Begin an analysis view
//! - GET /view/{id} - What the view shows now
//! - POST /view/{id}/stage - Report analysis stage
//! - POST /view/{id}/finish - Analysis flag cleared
//! - DELETE /view/{id} - Tear down view
//! - WS /ws/{id} - Live scan frames
//! - GET /health - Health check

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use crate::core::{markup, RevealController, ScanConfig, ScanDriver, SpanResolver};
use crate::types::{AnnotationOutput, HighlightSpan, RevealView, ScanFrame};
use crate::DEFAULT_BLOCK_EXTENT;

/// One essay view with its own reveal controller
#[derive(Debug)]
pub struct View {
    pub id: String,
    pub essay: String,
    pub highlights: Vec<HighlightSpan>,
    pub controller: Arc<Mutex<RevealController>>,
    pub driver: Option<ScanDriver>,
    /// Held only to resubscribe; the driver owns the sender, so the channel
    /// closes once the scan ends
    pub frames: broadcast::Receiver<ScanFrame>,
}

impl View {
    async fn snapshot(&self) -> RevealView {
        self.controller.lock().await.view(&self.essay, &self.highlights)
    }
}

/// App state
pub struct AppState {
    pub views: RwLock<HashMap<String, View>>,
    pub config: ScanConfig,
}

/// Annotate request
#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub essay: String,
    #[serde(default)]
    pub highlights: Vec<HighlightSpan>,
}

/// Annotate response
#[derive(Debug, Serialize)]
pub struct AnnotateResponse {
    #[serde(flatten)]
    pub output: AnnotationOutput,
    pub html: String,
}

/// Create view request
#[derive(Debug, Deserialize)]
pub struct NewViewRequest {
    pub essay: String,
    #[serde(default)]
    pub highlights: Vec<HighlightSpan>,
    /// Rendered height of the essay block
    pub extent: Option<f64>,
}

/// Create view response
#[derive(Debug, Serialize)]
pub struct NewViewResponse {
    pub view_id: String,
    pub websocket_url: String,
    pub scan_frames: u64,
}

/// Stage request
#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub stage: u32,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub views_active: usize,
}

/// Create the API router
pub fn create_router(config: ScanConfig) -> Router {
    let state = Arc::new(AppState {
        views: RwLock::new(HashMap::new()),
        config,
    });

    Router::new()
        .route("/health", get(health))
        .route("/annotate", post(annotate))
        .route("/view/new", post(create_view))
        .route("/view/:id", get(get_view).delete(delete_view))
        .route("/view/:id/stage", post(set_stage))
        .route("/view/:id/finish", post(finish_view))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let views = state.views.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        views_active: views.len(),
    })
}

/// Resolve and paint highlights in one shot
async fn annotate(Json(req): Json<AnnotateRequest>) -> Json<AnnotateResponse> {
    let plan = SpanResolver::new().resolve(&req.essay, &req.highlights);
    let units = markup::to_presentation(&plan);
    let html = markup::render_html(&units);
    Json(AnnotateResponse {
        output: AnnotationOutput::new(plan, units),
        html,
    })
}

/// Begin an analysis view and start its scan
async fn create_view(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewViewRequest>,
) -> Result<Json<NewViewResponse>, StatusCode> {
    let extent = req.extent.unwrap_or(DEFAULT_BLOCK_EXTENT);
    if !extent.is_finite() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let view_id = generate_view_id();
    let (tx, frames) = broadcast::channel(256);

    let mut controller = RevealController::new(state.config);
    let timer = controller.begin(extent);
    let controller = Arc::new(Mutex::new(controller));
    let driver = ScanDriver::spawn(
        controller.clone(),
        timer,
        state.config.frame_interval,
        tx,
    );

    let view = View {
        id: view_id.clone(),
        essay: req.essay,
        highlights: req.highlights,
        controller,
        driver: Some(driver),
        frames,
    };

    let mut views = state.views.write().await;
    views.insert(view_id.clone(), view);
    info!(view_id = %view_id, extent, "view created");

    Ok(Json(NewViewResponse {
        websocket_url: format!("/ws/{}", view_id),
        view_id,
        scan_frames: state.config.frames_for(extent),
    }))
}

/// Get what the view shows now
async fn get_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RevealView>, StatusCode> {
    let views = state.views.read().await;
    let view = views.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(view.snapshot().await))
}

/// Report analysis stage
async fn set_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StageRequest>,
) -> Result<Json<RevealView>, StatusCode> {
    let views = state.views.read().await;
    let view = views.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let reason = view.controller.lock().await.advance_stage(req.stage);
    debug!(view_id = %id, stage = req.stage, reason = reason.code(), "stage reported");
    Ok(Json(view.snapshot().await))
}

/// Analysis finished
async fn finish_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RevealView>, StatusCode> {
    let views = state.views.read().await;
    let view = views.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    view.controller.lock().await.finish();
    Ok(Json(view.snapshot().await))
}

/// Tear down a view and cancel its scan
async fn delete_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let mut views = state.views.write().await;
    let Some(mut view) = views.remove(&id) else {
        return StatusCode::NOT_FOUND;
    };
    if let Some(driver) = view.driver.take() {
        driver.cancel();
    }
    view.controller.lock().await.teardown();
    info!(view_id = %view.id, "view deleted");
    StatusCode::NO_CONTENT
}

/// WebSocket handler for scan frames
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let views = state.views.read().await;
    let view = views.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    // Ticks need the controller lock, so no frame slips between the check and the subscribe
    let controller = view.controller.lock().await;
    let feed = if controller.is_scanning() {
        FrameFeed::Live(view.frames.resubscribe())
    } else {
        FrameFeed::Over(controller.last_frame())
    };
    drop(controller);
    drop(views);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, feed).await;
    }))
}

/// What a new WebSocket subscriber gets
enum FrameFeed {
    Live(broadcast::Receiver<ScanFrame>),
    /// Scan already ended; send its last frame, if any, then close
    Over(Option<ScanFrame>),
}

/// Forward frames until the scan ends or the client leaves
async fn handle_websocket(socket: WebSocket, feed: FrameFeed) {
    let (mut sink, mut stream) = socket.split();

    let mut rx = match feed {
        FrameFeed::Live(rx) => rx,
        FrameFeed::Over(last) => {
            if let Some(frame) = last {
                let json = serde_json::to_string(&frame).unwrap_or_default();
                let _ = sink.send(Message::Text(json)).await;
            }
            debug!("scan already over, closing websocket");
            let _ = sink.close().await;
            return;
        }
    };

    loop {
        tokio::select! {
            frame = rx.recv() => {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "websocket lagged behind scan");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let json = serde_json::to_string(&frame).unwrap_or_default();
                if sink.send(Message::Text(json)).await.is_err() || frame.done {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    let _ = sink.close().await;
}

/// Generate view ID
fn generate_view_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    format!("view_{:x}_{}", nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Run the API server
pub async fn run_server(addr: &str, config: ScanConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "essaymark API listening");
    println!("Essaymark API running on {}", addr);
    println!("  POST   /annotate         - Annotate essay");
    println!("  POST   /view/new         - Begin analysis view");
    println!("  GET    /view/:id         - Current view");
    println!("  POST   /view/:id/stage   - Report stage");
    println!("  POST   /view/:id/finish  - Finish analysis");
    println!("  DELETE /view/:id         - Tear down view");
    println!("  WS     /ws/:id           - Scan frames");
    println!("  GET    /health           - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
