//! Annotation API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::annotations::{Annotation, AnnotationError, AnnotationFilter, NewAnnotation, PriceArea};
use crate::config::parse_bool;
use crate::error::Result;
use crate::state::AppState;
use crate::visitor::{AdminAuth, Visitor};

/// Create the annotations router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_annotations).post(create_annotation))
        .route("/:id", get(get_annotation))
        .route("/:id/vote", post(vote_annotation))
        .route("/:id/moderate", post(moderate_annotation))
}

/// Query parameters for listing annotations
#[derive(Debug, Deserialize)]
pub struct ListParams {
    date: Option<String>,
    area: Option<String>,
    /// Only the requesting visitor's own annotations (`true`, `1`, `yes`, ...)
    mine: Option<String>,
}

/// Request body for creating annotations
///
/// Missing fields default to empty so they fail validation like blank ones.
#[derive(Debug, Deserialize)]
pub struct CreateAnnotationRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub text: String,
    pub author: Option<String>,
    pub hour: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub vote: String,
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct AnnotationsListResponse {
    pub annotations: Vec<Annotation>,
    pub total: usize,
}

/// List annotations with optional filters
async fn list_annotations(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(params): Query<ListParams>,
) -> Result<Json<AnnotationsListResponse>> {
    let area = params
        .area
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .map(str::parse::<PriceArea>)
        .transpose()?;

    let mine = params
        .mine
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(|m| {
            parse_bool(m)
                .ok_or_else(|| AnnotationError::Validation(format!("invalid value '{}' for mine", m)))
        })
        .transpose()?
        .unwrap_or(false);

    let user_id = if mine {
        match visitor.user_id() {
            Some(id) => Some(id.to_string()),
            // An untracked visitor owns nothing
            None => {
                return Ok(Json(AnnotationsListResponse {
                    annotations: Vec::new(),
                    total: 0,
                }))
            }
        }
    } else {
        None
    };

    let filter = AnnotationFilter {
        date: params.date.filter(|d| !d.trim().is_empty()),
        area,
        user_id,
    };

    let annotations = state.annotations().list(&filter).await?;
    let total = annotations.len();
    Ok(Json(AnnotationsListResponse { annotations, total }))
}

/// Create a new annotation
async fn create_annotation(
    State(state): State<AppState>,
    visitor: Visitor,
    Json(req): Json<CreateAnnotationRequest>,
) -> Result<(StatusCode, Json<Annotation>)> {
    let annotation = state
        .annotations()
        .create(NewAnnotation {
            date: req.date,
            area: req.area,
            text: req.text,
            author: req.author,
            user_id: visitor.user_id().map(str::to_string),
            hour: req.hour,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(annotation)))
}

/// Get a single annotation
async fn get_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Annotation>> {
    Ok(Json(state.annotations().get(&id).await?))
}

/// Like or dislike an annotation
async fn vote_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Annotation>> {
    Ok(Json(state.annotations().vote(&id, &req.vote).await?))
}

/// Set an annotation's status by hand
async fn moderate_annotation(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ModerateRequest>,
) -> Result<Json<Annotation>> {
    Ok(Json(state.annotations().moderate(&id, &req.action).await?))
}
