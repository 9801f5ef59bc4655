//! HTTP routes: time authority, scoreboard API and the completion form.

use crate::authority::{now_ms, AuthorityError};
use crate::protocol::{
    scoreboard_location, CsrfResponse, PlayerQuery, RankResponse, ScoreForm, TimerQuery,
};
use crate::server::ServerState;
use crate::store::StoreError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use kana_core::{format_clock, parse_clock, ScoreRecord};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub type SharedState = Arc<ServerState>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown timer action '{0}'")]
    UnknownAction(String),

    #[error("Missing timer id")]
    MissingTimerId,

    #[error(transparent)]
    Timer(#[from] AuthorityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid player time '{0}'")]
    InvalidTime(String),

    #[error("Invalid anti-forgery token")]
    Forbidden,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownAction(_) | ApiError::MissingTimerId | ApiError::InvalidTime(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Timer(_) | ApiError::Store(StoreError::UnknownPlayer(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Store(StoreError::NamesExhausted) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/game/timer", get(timer))
        .route("/api/scoreboard", get(scoreboard))
        .route("/api/scoreboard/rank", get(rank))
        .route("/api/csrf", get(csrf))
        .route("/scoreboard", post(submit_score))
        .with_state(state)
}

/// Serve the HTTP routes.
pub async fn run_http(addr: SocketAddr, state: SharedState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn timer(
    State(state): State<SharedState>,
    Query(query): Query<TimerQuery>,
) -> Result<Response, ApiError> {
    match query.action.as_str() {
        "start" => Ok(Json(state.timers.start(now_ms())).into_response()),
        "stop" => {
            let tid = query.tid.ok_or(ApiError::MissingTimerId)?;
            let stop = state.timers.stop(&tid, now_ms())?;
            Ok(Json(stop).into_response())
        }
        other => Err(ApiError::UnknownAction(other.to_string())),
    }
}

async fn scoreboard(State(state): State<SharedState>) -> Json<Vec<ScoreRecord>> {
    let records = state
        .store
        .top(state.config.scoreboard_limit)
        .iter()
        .map(|t| t.to_record())
        .collect();
    Json(records)
}

async fn rank(
    State(state): State<SharedState>,
    Query(query): Query<PlayerQuery>,
) -> Result<Json<RankResponse>, ApiError> {
    let (time, rank) = state.store.rank(&query.p)?;
    Ok(Json(RankResponse {
        player: time.player,
        time: format_clock(time.elapsed.as_secs()),
        rank,
    }))
}

async fn csrf(State(state): State<SharedState>) -> Json<CsrfResponse> {
    Json(CsrfResponse {
        token: state.issue_csrf_token(),
    })
}

async fn submit_score(
    State(state): State<SharedState>,
    Form(form): Form<ScoreForm>,
) -> Result<Redirect, ApiError> {
    let token_ok = form
        .csrf_token
        .as_deref()
        .map(|token| state.redeem_csrf_token(token))
        .unwrap_or(false);
    if !token_ok {
        return Err(ApiError::Forbidden);
    }

    let seconds = parse_clock(&form.player_time)
        .ok_or_else(|| ApiError::InvalidTime(form.player_time.clone()))?;
    let player = state.store.insert(Duration::from_secs(seconds))?;
    info!("Recorded {} for {}", form.player_time, player);

    Ok(Redirect::to(&scoreboard_location(&player)))
}
