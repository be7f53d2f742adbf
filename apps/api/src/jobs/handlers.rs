//! Axum route handlers for the Jobs API.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::applications::service as applications;
use crate::caller::Caller;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::jobs::service;
use crate::models::category::CategoryRow;
use crate::models::job::{JobDetail, JobSummary, PostJobRequest, UpdateJobRequest};
use crate::models::MessageResponse;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub success: bool,
    pub jobs: Vec<JobSummary>,
    pub jobs_count: i64,
    pub result_per_page: i64,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: JobDetail,
}

#[derive(Debug, Serialize)]
pub struct PostJobResponse {
    pub success: bool,
    pub job: JobDetail,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobResponse {
    pub success: bool,
    pub message: String,
    pub applications_removed: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub success: bool,
    pub categories: Vec<CategoryRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs
///
/// Query keys filter on job fields (`salary[gte]=50000`, `jobTitle=rust`);
/// `page` selects the page.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> Result<Json<JobListResponse>, AppError> {
    let (listing, page) = service::list_jobs(state.store.as_ref(), &params).await?;
    Ok(Json(JobListResponse {
        success: true,
        jobs: listing.jobs,
        jobs_count: listing.total,
        result_per_page: page.per_page,
    }))
}

/// POST /api/v1/jobs
pub async fn handle_post_job(
    State(state): State<AppState>,
    AppJson(req): AppJson<PostJobRequest>,
) -> Result<Json<PostJobResponse>, AppError> {
    let job = service::post_job(state.store.as_ref(), req).await?;
    Ok(Json(PostJobResponse {
        success: true,
        job,
        message: "Job is posted".to_string(),
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let job = service::get_job(state.store.as_ref(), id).await?;
    Ok(Json(JobResponse { success: true, job }))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateJobRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    service::update_job(state.store.as_ref(), id, req).await?;
    Ok(Json(MessageResponse::ok("Job updated")))
}

/// DELETE /api/v1/jobs/:id
///
/// Cascades to every application of the job.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeleteJobResponse>, AppError> {
    let removed = service::delete_job(state.store.as_ref(), id).await?;
    Ok(Json(DeleteJobResponse {
        success: true,
        message: "Job is deleted".to_string(),
        applications_removed: removed,
    }))
}

/// POST /api/v1/jobs/:id/apply
///
/// The optional body carries free-form application data (cover letter, resume
/// link, ...). An empty body applies with no extra fields.
pub async fn handle_apply(
    State(state): State<AppState>,
    Caller(applicant_id): Caller,
    AppPath(id): AppPath<Uuid>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let fields = application_fields(&body)?;
    applications::apply(state.store.as_ref(), applicant_id, id, fields).await?;
    Ok(Json(MessageResponse::ok("Your application is registered")))
}

/// Parses an apply body: empty means no fields, otherwise it must be a JSON object.
fn application_fields(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    serde_json::from_slice::<Map<String, Value>>(body).map_err(|e| {
        AppError::Validation(format!("Application body must be a JSON object: {e}"))
    })
}

/// GET /api/v1/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = service::list_categories(state.store.as_ref()).await?;
    Ok(Json(CategoryListResponse {
        success: true,
        categories,
    }))
}
