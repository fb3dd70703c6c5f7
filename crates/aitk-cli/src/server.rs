use std::future::Future;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;
use std::thread;

use aitk_contracts::catalog::TOOL_CATALOG;
use aitk_contracts::{ToolError, ToolKind, ToolRequest, ToolResult};
use aitk_engine::Toolkit;
use anyhow::{anyhow, Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone)]
struct AppState {
    toolkit: Arc<Toolkit>,
    public_root: Arc<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteBody {
    tool_id: Option<u64>,
    #[serde(default)]
    query: String,
    size: Option<String>,
}

/// Builds the API + static router. `public_dir` must exist; it is
/// canonicalized once and every served file must resolve inside it.
pub fn router(toolkit: Arc<Toolkit>, public_dir: &FsPath) -> Result<Router> {
    let public_root = public_dir
        .canonicalize()
        .with_context(|| format!("public directory {} not found", public_dir.display()))?;
    let state = AppState {
        toolkit,
        public_root: Arc::new(public_root),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/execute", post(execute_tool))
        .route("/", get(serve_index))
        .route("/*path", get(serve_static))
        .with_state(state)
        .layer(cors))
}

/// Serves until Ctrl+C. Blocks the calling thread on its own runtime.
pub fn serve(toolkit: Arc<Toolkit>, public_dir: &FsPath, host: &str, port: u16) -> Result<()> {
    let app = router(toolkit, public_dir)?;
    let listener = bind(host, port)?;
    run_server(app, listener, "Press Ctrl+C to stop the server", shutdown_signal())
}

/// A server running on a background thread, stopped explicitly.
///
/// Installs no signal handler, so Ctrl+C keeps its default meaning for the
/// rest of the process.
pub struct RunningServer {
    address: SocketAddr,
    stop: oneshot::Sender<()>,
    thread: thread::JoinHandle<Result<()>>,
}

impl RunningServer {
    pub fn start(
        toolkit: Arc<Toolkit>,
        public_dir: &FsPath,
        host: &str,
        port: u16,
    ) -> Result<Self> {
        let app = router(toolkit, public_dir)?;
        let listener = bind(host, port)?;
        let address = listener.local_addr().context("failed to read bound address")?;
        let (stop, stopped) = oneshot::channel::<()>();
        let thread = thread::Builder::new()
            .name("aitk-web".to_string())
            .spawn(move || {
                run_server(app, listener, "Press Enter to stop the server", async move {
                    // A dropped sender also stops the server.
                    let _ = stopped.await;
                })
            })
            .context("failed to spawn web server thread")?;
        Ok(Self {
            address,
            stop,
            thread,
        })
    }

    #[cfg(test)]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Signals shutdown and waits for in-flight requests to finish.
    pub fn stop(self) -> Result<()> {
        // The receiver is gone only if the server already exited; join reports why.
        let _ = self.stop.send(());
        self.thread
            .join()
            .map_err(|_| anyhow!("web server thread panicked"))?
    }
}

fn bind(host: &str, port: u16) -> Result<StdTcpListener> {
    let listener = StdTcpListener::bind((host, port))
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to configure listener")?;
    Ok(listener)
}

fn run_server(
    app: Router,
    listener: StdTcpListener,
    stop_hint: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let address = listener.local_addr().context("failed to read bound address")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let listener =
            TcpListener::from_std(listener).context("failed to register listener")?;
        println!("\nServer running at http://{address}");
        println!("Open this URL in your browser to access the toolkit UI");
        println!("{stop_hint}\n");
        info!(%address, "web interface listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("web server failed")?;
        println!("\nStopping web interface...");
        Ok(())
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {err}");
    }
}

async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": TOOL_CATALOG }))
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "success": false, "error": message.into() });
    (status, Json(body)).into_response()
}

fn success(result: &ToolResult) -> Response {
    let outputs: Vec<String> = result
        .output_paths
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    let body = json!({
        "success": true,
        "result": result.summary,
        "outputs": outputs,
        "warnings": result.warnings,
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn execute_tool(
    State(state): State<AppState>,
    body: Result<Json<ExecuteBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let Some(kind) = body.tool_id.and_then(ToolKind::from_id) else {
        let shown = body
            .tool_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "missing".to_string());
        return failure(StatusCode::BAD_REQUEST, format!("Unknown tool: {shown}"));
    };

    let mut request = ToolRequest::new(kind, body.query);
    if let Some(size) = body.size {
        request = request.with_image_size(size);
    }

    let toolkit = state.toolkit.clone();
    let outcome = tokio::task::spawn_blocking(move || toolkit.try_execute(&request)).await;
    match outcome {
        Ok(Ok(result)) => {
            info!(tool = ?kind, outputs = result.output_paths.len(), "api tool finished");
            success(&result)
        }
        Ok(Err(err)) => {
            warn!(tool = ?kind, category = err.category(), "api tool failed: {err}");
            failure(status_for(&err), err.user_message())
        }
        Err(err) => {
            warn!("tool task aborted: {err}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Tool execution was interrupted")
        }
    }
}

fn status_for(err: &ToolError) -> StatusCode {
    if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn serve_index(State(state): State<AppState>) -> Response {
    send_file(&state.public_root, "index.html").await
}

async fn serve_static(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    send_file(&state.public_root, &path).await
}

async fn send_file(root: &FsPath, requested: &str) -> Response {
    let relative = FsPath::new(requested);
    let lexically_contained = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !lexically_contained {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    let resolved = match tokio::fs::canonicalize(root.join(relative)).await {
        Ok(resolved) => resolved,
        Err(_) => return (StatusCode::NOT_FOUND, "Not Found").into_response(),
    };
    // Symlinks may still point outside the root.
    if !resolved.starts_with(root) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    if !resolved.is_file() {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    match tokio::fs::read(&resolved).await {
        Ok(bytes) => ([(CONTENT_TYPE, content_type(&resolved))], bytes).into_response(),
        Err(err) => {
            warn!(path = %resolved.display(), "failed to read static file: {err}");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

fn content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "text/plain; charset=utf-8",
    }
}
