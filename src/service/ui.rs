use super::{BidRow, LoopService, RefreshTrigger, SharedBoard, StopSignal};
use crate::{event::Event, event_log, session::SharedSession};
use anyhow::{format_err, Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::{net::SocketAddr, time::Duration};
use tokio::{runtime::Handle, sync::oneshot};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct UiState {
    pub(crate) board: SharedBoard,
    pub(crate) session: SharedSession,
    pub(crate) event_writer: event_log::SharedWriter,
    pub(crate) trigger: RefreshTrigger,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    authenticated: bool,
    user_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardResponse {
    bids: Vec<BidRow>,
    loaded_at: Option<String>,
    error: Option<String>,
}

async fn list_bids(State(state): State<UiState>) -> Json<BoardResponse> {
    let board = state.board.read();
    Json(BoardResponse {
        bids: board.rows(),
        loaded_at: board.loaded_at().map(|t| t.to_rfc3339()),
        error: board.last_error().map(str::to_owned),
    })
}

async fn show_session(State(state): State<UiState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(SessionResponse {
        authenticated: session.is_authenticated(),
        user_name: session.user().map(|u| u.name.clone()),
    })
}

async fn logout(State(state): State<UiState>) -> StatusCode {
    let mut session = state.session.lock().await;
    if let Err(e) = session.logout() {
        warn!(error = %e, "logout failed");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    // still holding the session: a refresh publishes under the same lock
    match state.event_writer.write(&[Event::SessionEnded]) {
        Ok(_) => StatusCode::NO_CONTENT,
        Err(e) => {
            warn!(error = %e, "failed to publish logout");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn request_refresh(State(state): State<UiState>) -> StatusCode {
    state.trigger.request();
    StatusCode::ACCEPTED
}

pub(crate) fn router(state: UiState) -> Router {
    Router::new()
        .route("/bids", get(list_bids))
        .route("/session", get(show_session))
        .route("/refresh", post(request_refresh))
        .route("/logout", post(logout))
        .with_state(state)
}

async fn run_http_server(addr: SocketAddr, state: UiState, stop: StopSignal) -> Result<()> {
    info!(%addr, "serving ui");
    axum::Server::try_bind(&addr)?
        .serve(router(state).into_make_service())
        .with_graceful_shutdown(async move {
            while !stop.is_set() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await?;

    Ok(())
}

/// Local HTTP surface for the presentation layer
pub struct Ui {
    server_rx: oneshot::Receiver<Result<()>>,
}

impl Ui {
    pub fn new(
        runtime: &Handle,
        addr: SocketAddr,
        board: SharedBoard,
        session: SharedSession,
        event_writer: event_log::SharedWriter,
        trigger: RefreshTrigger,
        stop: StopSignal,
    ) -> Self {
        let (tx, rx) = oneshot::channel();
        let state = UiState {
            board,
            session,
            event_writer,
            trigger,
        };

        runtime.spawn(async move {
            // receiver only goes away when the service does
            let _ = tx.send(
                run_http_server(addr, state, stop)
                    .await
                    .with_context(|| format!("Failed to run http server on {}", addr)),
            );
        });

        Self { server_rx: rx }
    }
}

impl LoopService for Ui {
    fn run_iteration(&mut self) -> Result<()> {
        // don't hog the cpu
        std::thread::sleep(Duration::from_millis(100));

        match self.server_rx.try_recv() {
            Ok(res) => res,
            Err(oneshot::error::TryRecvError::Empty) => Ok(()),
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(format_err!("ui server died without leaving a response"))
            }
        }
    }
}
