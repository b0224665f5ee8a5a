use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use rmp_types::{BasicProfessorRecord, ProfessorSearchHit};
use std::sync::Arc;

use super::dto::*;
use super::error::ApiError;
use super::state::AppState;
use crate::engine::context::{self, CourseContext, PromptParts};

/// `{id}/{course}/{course_display}/{prompt}` path segments
type FeedbackPath = Path<(String, String, String, String)>;

/// GET / - Liveness check
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Up and running.",
    })
}

/// Fetch the professor and build the agent input for one question
async fn prepare_prompt(
    state: &AppState,
    (id, course, course_display, prompt): (String, String, String, String),
) -> Result<PromptParts, ApiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("Prompt cannot be empty".into()));
    }

    let course = course.trim();
    let filter = (!course.is_empty()).then_some(course);
    let info = state.retriever.get_professor(&id, filter).await?;
    tracing::info!(%id, course, ratings = info.ratings.len(), "professor loaded");

    let course = CourseContext {
        code: course,
        display_name: &course_display,
    };
    Ok(context::build_prompt(&id, &info, &course, prompt))
}

/// GET /prof_feedback/{id}/{course}/{course_display}/{prompt}
pub async fn prof_feedback(
    State(state): State<Arc<AppState>>,
    Path(params): FeedbackPath,
) -> Result<Json<String>, ApiError> {
    let parts = prepare_prompt(&state, params).await?;

    let answer = state.llm.complete(&parts).await?;

    Ok(Json(answer))
}

/// GET /stream_prof_feedback/{id}/{course}/{course_display}/{prompt}
pub async fn stream_prof_feedback(
    State(state): State<Arc<AppState>>,
    Path(params): FeedbackPath,
) -> Result<Response, ApiError> {
    let parts = prepare_prompt(&state, params).await?;

    // Headers are already sent once chunks flow; a failure only cuts the body short.
    let chunks = state
        .llm
        .stream(&parts)
        .await?
        .inspect_err(|e| tracing::warn!(error = %e, "completion stream aborted"));

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(chunks),
    )
        .into_response())
}

/// POST /professors/basic - Names for a batch of ids, in request order
pub async fn basic(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<Vec<Option<BasicProfessorRecord>>>, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("ids cannot be empty".into()));
    }

    let records = state.retriever.get_multi_basic(&req.ids).await?;
    Ok(Json(records))
}

/// POST /professors/details - Full records for a batch of ids, in request order
pub async fn details(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<Vec<ProfessorDetail>>, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("ids cannot be empty".into()));
    }

    let records = state.retriever.get_multi_detail(&req.ids).await?;
    Ok(Json(records.into_iter().map(ProfessorDetail::from).collect()))
}

/// POST /professors/search - Best match per name at the configured school
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NamesRequest>,
) -> Result<Json<Vec<Option<ProfessorSearchHit>>>, ApiError> {
    if req.names.is_empty() {
        return Err(ApiError::BadRequest("names cannot be empty".into()));
    }

    let hits = state.retriever.search_professors(&req.names).await?;
    tracing::info!(
        requested = req.names.len(),
        matched = hits.iter().flatten().count(),
        "professor search"
    );
    Ok(Json(hits))
}
