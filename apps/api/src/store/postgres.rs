//! PostgreSQL-backed `JobBoardStore`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::ApplicantRow;
use crate::models::application::{
    ApplicationDetail, ApplicationPage, ApplicationRow, ApplicationStatus, InterviewSlot,
};
use crate::models::category::{CategoryRow, NewCategory};
use crate::models::job::{
    ApplicationCounts, JobDetail, JobPage, JobRow, JobSummary, JobUpdate, NewJob,
};
use crate::query::fields::{ApplicationField, JobField};
use crate::query::filter::Filter;
use crate::query::pagination::Page;
use crate::query::sql::push_filter;
use crate::store::{ApplicationChange, ApplyOutcome, JobBoardStore};

const JOB_COLUMNS: &str = "j.id, j.job_title, j.jd, j.about_company, j.experience, j.job_type, \
     j.job_location, j.salary, j.skills, j.perks, j.starting_date, j.last_apply, \
     j.category_id, j.created_at";

#[derive(FromRow)]
struct JobCountsRow {
    #[sqlx(flatten)]
    job: JobRow,
    #[sqlx(flatten)]
    counts: ApplicationCounts,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn categories_by_id(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, CategoryRow>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|c| (c.id, c)).collect())
    }
}

#[async_trait]
impl JobBoardStore for PgStore {
    async fn create_job(
        &self,
        category: NewCategory,
        job: NewJob,
    ) -> Result<(JobRow, CategoryRow), AppError> {
        let mut tx = self.pool.begin().await?;

        let category_row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (id, title, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET title = EXCLUDED.title
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&category.title)
        .bind(&category.slug)
        .fetch_one(&mut *tx)
        .await?;

        let job_row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, job_title, jd, about_company, experience, job_type, job_location,
                 salary, skills, perks, starting_date, last_apply, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.job_title)
        .bind(&job.jd)
        .bind(&job.about_company)
        .bind(job.experience)
        .bind(&job.job_type)
        .bind(&job.job_location)
        .bind(job.salary)
        .bind(&job.skills)
        .bind(&job.perks)
        .bind(&job.starting_date)
        .bind(job.last_apply)
        .bind(category_row.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((job_row, category_row))
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobDetail>, AppError> {
        let Some(job) = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let category = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1")
            .bind(job.category_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(Some(JobDetail { job, category }))
    }

    async fn list_job_summaries(
        &self,
        filter: &Filter<JobField>,
        page: Page,
    ) -> Result<JobPage, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            r#"
            SELECT {JOB_COLUMNS},
                COUNT(a.id) AS total_applications,
                COUNT(a.id) FILTER (WHERE a.is_scheduled) AS total_scheduled,
                COUNT(a.id) FILTER (WHERE a.status = '{rejected}') AS total_rejected,
                COUNT(a.id) FILTER (WHERE a.status = '{selected}') AS total_selected
            FROM jobs j
            LEFT JOIN applications a ON a.job_id = j.id
            WHERE TRUE"#,
            rejected = ApplicationStatus::Rejected.as_str(),
            selected = ApplicationStatus::Selected.as_str(),
        ));
        push_filter(&mut query, filter, "j");
        query.push(" GROUP BY j.id ORDER BY j.created_at DESC, j.id DESC OFFSET ");
        query.push_bind(page.skip());
        query.push(" LIMIT ");
        query.push_bind(page.limit());
        debug!(sql = query.sql(), "job listing query");

        let rows = query
            .build_query_as::<JobCountsRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM jobs j WHERE TRUE");
        push_filter(&mut count, filter, "j");
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let category_ids = rows.iter().map(|r| r.job.category_id).collect();
        let categories = self.categories_by_id(category_ids).await?;

        let jobs = rows
            .into_iter()
            .map(|row| JobSummary {
                category: categories.get(&row.job.category_id).cloned(),
                job: row.job,
                counts: row.counts,
            })
            .collect();

        Ok(JobPage { jobs, total })
    }

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET
                job_title     = COALESCE($2, job_title),
                jd            = COALESCE($3, jd),
                about_company = COALESCE($4, about_company),
                experience    = COALESCE($5, experience),
                job_type      = COALESCE($6, job_type),
                job_location  = COALESCE($7, job_location),
                salary        = COALESCE($8, salary),
                skills        = COALESCE($9, skills),
                perks         = COALESCE($10, perks),
                starting_date = COALESCE($11, starting_date),
                last_apply    = COALESCE($12, last_apply)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.job_title)
        .bind(update.jd)
        .bind(update.about_company)
        .bind(update.experience)
        .bind(update.job_type)
        .bind(update.job_location)
        .bind(update.salary)
        .bind(update.skills)
        .bind(update.perks)
        .bind(update.starting_date)
        .bind(update.last_apply)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Waits for in-flight applies holding a share lock on the job.
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM applications WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRow>, AppError> {
        Ok(
            sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY title, id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_applicant(
        &self,
        name: String,
        email: String,
    ) -> Result<ApplicantRow, AppError> {
        Ok(sqlx::query_as::<_, ApplicantRow>(
            "INSERT INTO applicants (id, name, email) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn apply(
        &self,
        applicant_id: Uuid,
        job_id: Uuid,
        details: Value,
    ) -> Result<ApplyOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Share lock keeps a concurrent delete_job from removing the job mid-apply.
        let category_id: Option<Uuid> =
            sqlx::query_scalar("SELECT category_id FROM jobs WHERE id = $1 FOR SHARE")
                .bind(job_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(category_id) = category_id else {
            return Ok(ApplyOutcome::JobNotFound);
        };

        // Row lock serializes concurrent applies by the same applicant.
        let my_jobs: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT my_jobs FROM applicants WHERE id = $1 FOR UPDATE")
                .bind(applicant_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(my_jobs) = my_jobs else {
            return Ok(ApplyOutcome::ApplicantNotFound);
        };
        if my_jobs.contains(&job_id) {
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        sqlx::query("UPDATE applicants SET my_jobs = array_append(my_jobs, $2) WHERE id = $1")
            .bind(applicant_id)
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        let application = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (id, applicant_id, job_id, category_id, status, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(applicant_id)
        .bind(job_id)
        .bind(category_id)
        .bind(ApplicationStatus::default().as_str())
        .bind(details)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ApplyOutcome::Applied(application))
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn schedule_interview(
        &self,
        id: Uuid,
        slot: &InterviewSlot,
    ) -> Result<Option<ApplicationRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET is_scheduled = TRUE, assigned_to = $2, interview_time = $3, status = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&slot.interviewer)
        .bind(slot.time)
        .bind(ApplicationStatus::Scheduled.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_application(
        &self,
        id: Uuid,
        change: ApplicationChange,
    ) -> Result<Option<ApplicationRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET status = $2, salary_offered = COALESCE($3, salary_offered)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.status.as_str())
        .bind(change.salary_offered)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn soft_delete_application(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE applications SET is_deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_applications(
        &self,
        filter: &Filter<ApplicationField>,
        page: Page,
    ) -> Result<ApplicationPage, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT a.* FROM applications a WHERE a.is_deleted = FALSE");
        push_filter(&mut query, filter, "a");
        query.push(" ORDER BY a.created_at DESC, a.id DESC OFFSET ");
        query.push_bind(page.skip());
        query.push(" LIMIT ");
        query.push_bind(page.limit());

        let rows = query
            .build_query_as::<ApplicationRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM applications a WHERE a.is_deleted = FALSE");
        push_filter(&mut count, filter, "a");
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let job_ids: Vec<Uuid> = rows.iter().map(|r| r.job_id).collect();
        let applicant_ids: Vec<Uuid> = rows.iter().map(|r| r.applicant_id).collect();

        let jobs: HashMap<Uuid, JobRow> =
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ANY($1)")
                .bind(job_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|j| (j.id, j))
                .collect();
        let applicants: HashMap<Uuid, ApplicantRow> =
            sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = ANY($1)")
                .bind(applicant_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|a| (a.id, a))
                .collect();

        let applications = rows
            .into_iter()
            .map(|application| ApplicationDetail {
                job: jobs.get(&application.job_id).cloned(),
                applicant: applicants.get(&application.applicant_id).cloned(),
                application,
            })
            .collect();

        Ok(ApplicationPage {
            applications,
            total,
        })
    }

    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
