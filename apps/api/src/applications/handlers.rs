use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::applications::service;
use crate::caller::Caller;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::application::{
    ApplicationDetail, ApplicationRow, ScheduleInterviewRequest, StatusChangeRequest,
    UpdateApplicationRequest,
};
use crate::models::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub success: bool,
    pub applications: Vec<ApplicationDetail>,
    pub result_per_page: i64,
    pub application_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MyApplicationsResponse {
    pub success: bool,
    pub applications: Vec<ApplicationRow>,
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let (listing, page) = service::list_applications(state.store.as_ref(), &params).await?;
    Ok(Json(ApplicationListResponse {
        success: true,
        applications: listing.applications,
        result_per_page: page.per_page,
        application_count: listing.total,
    }))
}

/// GET /api/v1/applications/me
pub async fn handle_my_applications(
    State(state): State<AppState>,
    Caller(applicant_id): Caller,
) -> Result<Json<MyApplicationsResponse>, AppError> {
    let applications = service::list_my_applications(state.store.as_ref(), applicant_id).await?;
    Ok(Json(MyApplicationsResponse {
        success: true,
        applications,
    }))
}

/// POST /api/v1/applications/:id/interview
pub async fn handle_schedule_interview(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ScheduleInterviewRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    service::schedule_interview(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config.mail_from,
        id,
        req,
    )
    .await?;
    Ok(Json(MessageResponse::ok("Interview scheduled")))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_change_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<StatusChangeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    service::change_status(state.store.as_ref(), id, &req.status).await?;
    Ok(Json(MessageResponse::ok("Status changed")))
}

/// PUT /api/v1/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateApplicationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    service::update_application(state.store.as_ref(), id, req).await?;
    Ok(Json(MessageResponse::ok("Application updated")))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_withdraw_application(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service::withdraw(state.store.as_ref(), id).await?;
    Ok(Json(MessageResponse::ok("Application withdrawn")))
}
