//! Router for the chat API

use std::sync::Arc;

use anyhow::Error;
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::sync::mpsc;

use super::public;
use crate::api::relay::{body_stream, relay};
use crate::api::state::AppState;
use crate::openai::Role;

type SharedState = Arc<AppState>;

/// Answer the newest message in the transcript and stream the reply
/// back as plain text
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(transcript): axum::Json<public::ChatRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    match transcript.last() {
        None => {
            return Ok((StatusCode::BAD_REQUEST, "Transcript must not be empty").into_response());
        }
        Some(last) if last.role != Role::User => {
            return Ok((
                StatusCode::BAD_REQUEST,
                "The last message in the transcript must be from the user",
            )
                .into_response());
        }
        Some(_) => {}
    }

    // Nothing has been sent to the client yet so any upstream error
    // here becomes a 500
    let deltas = state.chat.reply(&transcript).await?;

    let (tx, rx) = mpsc::unbounded_channel::<Result<String, Error>>();
    tokio::spawn(relay(deltas, tx));

    let body = Body::from_stream(body_stream(rx));
    Ok(([(header::CONTENT_TYPE, public::CONTENT_TYPE)], body).into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(chat_handler))
}
