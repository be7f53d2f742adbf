use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::applicant::{ApplicantRow, RegisterApplicantRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ApplicantResponse {
    pub success: bool,
    pub applicant: ApplicantRow,
}

/// POST /api/v1/applicants
///
/// Registers an applicant identity. Credentials are managed elsewhere.
pub async fn handle_register_applicant(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterApplicantRequest>,
) -> Result<(StatusCode, Json<ApplicantResponse>), AppError> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(format!("'{email}' is not an email address")));
    }

    let applicant = state
        .store
        .create_applicant(name.to_string(), email.to_lowercase())
        .await?;
    info!(applicant_id = %applicant.id, "applicant registered");

    Ok((
        StatusCode::CREATED,
        Json(ApplicantResponse {
            success: true,
            applicant,
        }),
    ))
}
