use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::instant::InstantInput;
use crate::models::category::CategoryRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub job_title: String,
    /// Job description.
    pub jd: String,
    pub about_company: String,
    /// Years of experience asked for.
    pub experience: Option<i32>,
    pub job_type: Option<String>,
    pub job_location: Option<String>,
    pub salary: Option<i64>,
    pub skills: Vec<String>,
    pub perks: Option<String>,
    pub starting_date: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_apply: Option<DateTime<Utc>>,
    pub category_id: Uuid,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Application statistics attached to each job in the listing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCounts {
    pub total_applications: i64,
    pub total_scheduled: i64,
    pub total_rejected: i64,
    pub total_selected: i64,
}

/// A job with its category resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: JobRow,
    pub category: Option<CategoryRow>,
}

/// One entry of the aggregated job listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: JobRow,
    pub category: Option<CategoryRow>,
    #[serde(flatten)]
    pub counts: ApplicationCounts,
}

/// A page of the job listing plus the number of jobs matching the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPage {
    pub jobs: Vec<JobSummary>,
    pub total: i64,
}

/// Validated fields of a job about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub job_title: String,
    pub jd: String,
    pub about_company: String,
    pub experience: Option<i32>,
    pub job_type: Option<String>,
    pub job_location: Option<String>,
    pub salary: Option<i64>,
    pub skills: Vec<String>,
    pub perks: Option<String>,
    pub starting_date: Option<String>,
    pub last_apply: Option<DateTime<Utc>>,
}

/// Mutable job fields; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub job_title: Option<String>,
    pub jd: Option<String>,
    pub about_company: Option<String>,
    pub experience: Option<i32>,
    pub job_type: Option<String>,
    pub job_location: Option<String>,
    pub salary: Option<i64>,
    pub skills: Option<Vec<String>>,
    pub perks: Option<String>,
    pub starting_date: Option<String>,
    pub last_apply: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostJobRequest {
    pub category_title: String,
    pub job_title: String,
    #[serde(default)]
    pub jd: String,
    #[serde(default)]
    pub about_company: String,
    pub experience: Option<i32>,
    pub job_type: Option<String>,
    pub job_location: Option<String>,
    pub salary: Option<i64>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub perks: Option<String>,
    pub starting_date: Option<String>,
    pub last_apply: Option<InstantInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub job_title: Option<String>,
    pub jd: Option<String>,
    pub about_company: Option<String>,
    pub experience: Option<i32>,
    pub job_type: Option<String>,
    pub job_location: Option<String>,
    pub salary: Option<i64>,
    pub skills: Option<Vec<String>>,
    pub perks: Option<String>,
    pub starting_date: Option<String>,
    pub last_apply: Option<InstantInput>,
}
