use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::instant::InstantInput;
use crate::models::applicant::ApplicantRow;
use crate::models::job::JobRow;

/// Lifecycle status of an application.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "shortlisted")]
    Shortlisted,
    #[serde(rename = "Scheduled")]
    Scheduled,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "selected")]
    Selected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Scheduled,
        ApplicationStatus::Rejected,
        ApplicationStatus::Selected,
    ];

    /// Canonical stored form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Scheduled => "Scheduled",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Selected => "selected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                AppError::Validation(format!(
                    "Unknown application status '{wanted}'; expected one of: {}",
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub job_id: Uuid,
    /// Copied from the job when the application was created.
    pub category_id: Uuid,
    pub status: String,
    pub is_scheduled: bool,
    pub assigned_to: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub interview_time: Option<DateTime<Utc>>,
    pub salary_offered: Option<i64>,
    /// Free-form fields submitted with the application (cover letter, resume link, ...).
    pub details: Value,
    pub is_deleted: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// An application with its job and applicant resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub job: Option<JobRow>,
    pub applicant: Option<ApplicantRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationPage {
    pub applications: Vec<ApplicationDetail>,
    pub total: i64,
}

/// Interview assignment written by the schedule operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewSlot {
    pub interviewer: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInterviewRequest {
    pub interviewer_name: String,
    pub interview_time: InstantInput,
    /// Where to send the interviewer's notice. Without it only the applicant is notified.
    pub interviewer_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApplicationRequest {
    pub status: String,
    pub salary: Option<i64>,
}
