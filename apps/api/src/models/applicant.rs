use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Jobs this applicant has applied to.
    pub my_jobs: Vec<Uuid>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterApplicantRequest {
    pub name: String,
    pub email: String,
}
