//! Storage seam for the job board.
//!
//! Every multi-write operation (`create_job`, `delete_job`, `apply`) is a single
//! method so each backend can make it atomic: PostgreSQL wraps it in a
//! transaction, the in-memory backend holds its write lock for the whole call.
//!
//! `AppState` carries an `Arc<dyn JobBoardStore>`, chosen at startup from config.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::ApplicantRow;
use crate::models::application::{ApplicationPage, ApplicationRow, ApplicationStatus, InterviewSlot};
use crate::models::category::{CategoryRow, NewCategory};
use crate::models::job::{JobDetail, JobPage, JobRow, JobUpdate, NewJob};
use crate::query::fields::{ApplicationField, JobField};
use crate::query::filter::Filter;
use crate::query::pagination::Page;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of an apply attempt. Domain rejections are values, not errors, so the
/// backend can decide them inside its transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(ApplicationRow),
    JobNotFound,
    ApplicantNotFound,
    AlreadyApplied,
}

/// Fields written by an application status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationChange {
    pub status: ApplicationStatus,
    /// `None` keeps the stored offer.
    pub salary_offered: Option<i64>,
}

#[async_trait]
pub trait JobBoardStore: Send + Sync {
    /// Upserts the category by slug (refreshing its title) and inserts the job under it.
    async fn create_job(
        &self,
        category: NewCategory,
        job: NewJob,
    ) -> Result<(JobRow, CategoryRow), AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobDetail>, AppError>;

    /// The job aggregation: filter, join applications, count, sort newest-first, paginate.
    async fn list_job_summaries(
        &self,
        filter: &Filter<JobField>,
        page: Page,
    ) -> Result<JobPage, AppError>;

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<Option<JobRow>, AppError>;

    /// Deletes the job and every application referencing it.
    /// Returns `None` if the job did not exist, else the number of applications removed.
    async fn delete_job(&self, id: Uuid) -> Result<Option<u64>, AppError>;

    async fn list_categories(&self) -> Result<Vec<CategoryRow>, AppError>;

    async fn create_applicant(&self, name: String, email: String)
        -> Result<ApplicantRow, AppError>;

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, AppError>;

    /// Records `job_id` under the applicant's applied jobs and creates the application.
    async fn apply(
        &self,
        applicant_id: Uuid,
        job_id: Uuid,
        details: Value,
    ) -> Result<ApplyOutcome, AppError>;

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError>;

    async fn schedule_interview(
        &self,
        id: Uuid,
        slot: &InterviewSlot,
    ) -> Result<Option<ApplicationRow>, AppError>;

    async fn update_application(
        &self,
        id: Uuid,
        change: ApplicationChange,
    ) -> Result<Option<ApplicationRow>, AppError>;

    /// Marks the application deleted; it disappears from the admin listing.
    async fn soft_delete_application(&self, id: Uuid) -> Result<bool, AppError>;

    /// Non-deleted applications matching `filter`, newest first, with job and applicant resolved.
    async fn list_applications(
        &self,
        filter: &Filter<ApplicationField>,
        page: Page,
    ) -> Result<ApplicationPage, AppError>;

    /// Every application of one applicant, newest first.
    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, AppError>;
}
