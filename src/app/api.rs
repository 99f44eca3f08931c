use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use super::terminal::{CommandRes, Terminal, TerminalConfig};

pub const SESSION_HEADER: &str = "x-session-id";
const DEFAULT_SESSION: &str = "default";
const ROOT_PATH: &str = "~";

/// Bounds on the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

struct SessionSlot {
    terminal: Terminal,
    last_used: Instant,
}

/// One terminal per session id. A session's terminal is only touched while
/// its map entry is locked, so its commands never interleave.
#[derive(Clone)]
pub struct AppState {
    terminals: Arc<DashMap<String, SessionSlot>>,
    config: Arc<TerminalConfig>,
    limits: SessionLimits,
}

impl AppState {
    pub fn new(config: TerminalConfig) -> Self {
        Self::with_limits(config, SessionLimits::default())
    }

    pub fn with_limits(config: TerminalConfig, limits: SessionLimits) -> Self {
        Self {
            terminals: Arc::new(DashMap::new()),
            config: Arc::new(config),
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn session_count(&self) -> usize {
        self.terminals.len()
    }

    /// Drops every session unused for longer than the idle timeout.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.terminals.len();
        let timeout = self.limits.idle_timeout;
        self.terminals
            .retain(|_, slot| now.saturating_duration_since(slot.last_used) <= timeout);
        let evicted = before.saturating_sub(self.terminals.len());
        if evicted > 0 {
            info!(evicted, "evicted idle terminal sessions");
        }
        evicted
    }

    /// Makes room for one more session: idle sessions go first, then the
    /// least recently used ones.
    fn make_room(&self) {
        if self.terminals.len() < self.limits.max_sessions {
            return;
        }
        self.evict_idle();
        while self.terminals.len() >= self.limits.max_sessions {
            let oldest = self
                .terminals
                .iter()
                .min_by_key(|slot| slot.last_used)
                .map(|slot| slot.key().clone());
            let Some(oldest) = oldest else { break };
            info!(session_id = %oldest, "evicting least recently used session");
            self.terminals.remove(&oldest);
        }
    }

    fn with_terminal<R>(&self, session_id: &str, f: impl FnOnce(&mut Terminal) -> R) -> R {
        if !self.terminals.contains_key(session_id) {
            self.make_room();
        }
        let mut slot = self
            .terminals
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!(session_id, "opening terminal session");
                SessionSlot {
                    terminal: Terminal::new(self.config.as_ref().clone()),
                    last_used: Instant::now(),
                }
            });
        slot.last_used = Instant::now();
        f(&mut slot.terminal)
    }

    /// Current path of an existing session; unknown sessions sit at the root.
    fn path_of(&self, session_id: &str) -> String {
        self.terminals
            .get(session_id)
            .map(|slot| slot.terminal.current_path())
            .unwrap_or_else(|| ROOT_PATH.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid x-session-id header")]
    InvalidSessionId,
    #[error("command must be valid UTF-8")]
    InvalidCommand,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected request");
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecRequest {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResponse {
    pub output: String,
    pub is_err: bool,
    pub path: String,
    pub prompt: String,
}

fn session_id(headers: &HeaderMap) -> Result<String, AppError> {
    match headers.get(SESSION_HEADER) {
        None => Ok(DEFAULT_SESSION.to_string()),
        Some(value) => {
            let value = value.to_str().map_err(|_| AppError::InvalidSessionId)?.trim();
            if value.is_empty() {
                Ok(DEFAULT_SESSION.to_string())
            } else {
                Ok(value.to_string())
            }
        }
    }
}

fn log_result(session_id: &str, command: &str, res: &CommandRes) {
    if res.is_error() {
        warn!(session_id, command, output = res.text(), "command failed");
    } else {
        debug!(session_id, command, "command ok");
    }
}

async fn execute_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, AppError> {
    let session_id = session_id(&headers)?;
    let command = std::str::from_utf8(&body).map_err(|_| AppError::InvalidCommand)?;
    let res = state.with_terminal(&session_id, |terminal| terminal.handle_command(command));
    log_result(&session_id, command, &res);
    Ok(res.into_text())
}

async fn execute_json(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExecRequest>,
) -> Result<Json<ExecResponse>, AppError> {
    let session_id = session_id(&headers)?;
    let response = state.with_terminal(&session_id, |terminal| {
        let res = terminal.handle_command(&request.command);
        log_result(&session_id, &request.command, &res);
        ExecResponse {
            is_err: res.is_error(),
            output: res.into_text(),
            path: terminal.current_path(),
            prompt: terminal.prompt(),
        }
    });
    Ok(Json(response))
}

async fn current_path(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<String, AppError> {
    let session_id = session_id(&headers)?;
    Ok(state.path_of(&session_id))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/terminal/execute", post(execute_text))
        .route("/api/terminal/exec", post(execute_json))
        .route("/api/terminal/path", get(current_path))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use http::{header, Request};
    use tower::ServiceExt;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn execute(session: Option<&str>, command: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/terminal/execute");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::from(command.to_string())).unwrap()
    }

    fn path(session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/terminal/path");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_execute_returns_plain_output() {
        let state = AppState::new(TerminalConfig::default());
        let app = router(state.clone());

        let (status, body) = send(&app, execute(None, "mkdir projeto")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "mkdir: Diretório 'projeto' criado com sucesso");

        let (_, body) = send(&app, execute(None, "cd projeto")).await;
        assert_eq!(body, "");
        let (_, body) = send(&app, execute(None, "pwd")).await;
        assert_eq!(body, "~/projeto");
        assert_eq!(state.session_count(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let state = AppState::new(TerminalConfig::default());
        let app = router(state.clone());

        send(&app, execute(Some("alice"), "mkdir shared")).await;
        send(&app, execute(Some("alice"), "cd shared")).await;

        let (_, alice) = send(&app, path(Some("alice"))).await;
        let (_, bob) = send(&app, path(Some("bob"))).await;
        assert_eq!(alice, "~/shared");
        assert_eq!(bob, "~");

        let (_, tree) = send(&app, execute(Some("bob"), "tree")).await;
        assert_eq!(tree, "");
        assert_eq!(state.session_count(), 2);
    }

    #[tokio::test]
    async fn test_path_does_not_open_sessions() {
        let state = AppState::new(TerminalConfig::default());
        let app = router(state.clone());

        for i in 0..50 {
            let (status, body) = send(&app, path(Some(&format!("tab-{i}")))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "~");
        }
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_session_table_is_bounded() {
        let limits = SessionLimits {
            max_sessions: 3,
            idle_timeout: Duration::from_secs(3600),
        };
        let state = AppState::with_limits(TerminalConfig::default(), limits);
        let app = router(state.clone());

        send(&app, execute(Some("keep"), "mkdir kept")).await;
        for i in 0..10 {
            send(&app, execute(Some(&format!("tab-{i}")), "pwd")).await;
            send(&app, execute(Some("keep"), "pwd")).await;
        }
        assert_eq!(state.session_count(), 3);

        // the busiest session survived every eviction
        let (_, tree) = send(&app, execute(Some("keep"), "tree")).await;
        assert_eq!(tree, "└── kept");
    }

    #[test]
    fn test_evict_idle_sessions() {
        let limits = SessionLimits {
            max_sessions: 16,
            idle_timeout: Duration::from_secs(60),
        };
        let state = AppState::with_limits(TerminalConfig::default(), limits);
        state.with_terminal("a", |terminal| terminal.execute("pwd"));
        state.with_terminal("b", |terminal| terminal.execute("pwd"));

        assert_eq!(state.evict_idle(), 0);
        assert_eq!(state.session_count(), 2);

        let later = Instant::now() + Duration::from_secs(120);
        assert_eq!(state.evict_idle_at(later), 2);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_exec_json() {
        let app = router(AppState::new(TerminalConfig::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/terminal/exec")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"command":"cat nope"}"#))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let response: ExecResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(
            response,
            ExecResponse {
                output: "cat: nope: arquivo não encontrado".to_string(),
                is_err: true,
                path: "~".to_string(),
                prompt: "user@terminal:~ $".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_rejects_invalid_utf8_command() {
        let app = router(AppState::new(TerminalConfig::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/terminal/execute")
            .body(Body::from(vec![0xff, 0xfe]))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "command must be valid UTF-8");
    }

    #[test]
    fn test_session_id_defaults() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers).unwrap(), "default");
        headers.insert(SESSION_HEADER, "  ".parse().unwrap());
        assert_eq!(session_id(&headers).unwrap(), "default");
        headers.insert(SESSION_HEADER, "tab-1".parse().unwrap());
        assert_eq!(session_id(&headers).unwrap(), "tab-1");
    }
}
