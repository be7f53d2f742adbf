//! Job lifecycle: post, read, list, update, delete.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::slug::slugify;
use crate::models::category::{CategoryRow, NewCategory};
use crate::models::job::{JobDetail, JobPage, JobRow, JobUpdate, NewJob, PostJobRequest, UpdateJobRequest};
use crate::query::fields::JobField;
use crate::query::filter::Filter;
use crate::query::pagination::{Page, JOBS_PER_PAGE};
use crate::store::JobBoardStore;

fn non_blank(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Posts a job under the category named by `categoryTitle`, creating the
/// category on first use.
pub async fn post_job(store: &dyn JobBoardStore, req: PostJobRequest) -> Result<JobDetail, AppError> {
    let category_title = non_blank("categoryTitle", &req.category_title)?;
    let slug = slugify(&category_title);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "categoryTitle must contain at least one letter or digit".to_string(),
        ));
    }

    let last_apply = req
        .last_apply
        .as_ref()
        .map(|v| v.resolve("lastApply"))
        .transpose()?;

    let job = NewJob {
        job_title: non_blank("jobTitle", &req.job_title)?,
        jd: req.jd,
        about_company: req.about_company,
        experience: req.experience,
        job_type: req.job_type,
        job_location: req.job_location,
        salary: req.salary,
        skills: req.skills,
        perks: req.perks,
        starting_date: req.starting_date,
        last_apply,
    };

    let (job, category) = store
        .create_job(
            NewCategory {
                title: category_title,
                slug,
            },
            job,
        )
        .await?;

    info!(job_id = %job.id, category = %category.slug, "job posted");
    Ok(JobDetail {
        job,
        category: Some(category),
    })
}

pub async fn get_job(store: &dyn JobBoardStore, id: Uuid) -> Result<JobDetail, AppError> {
    store
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

/// Filtered, paginated job listing with per-job application counts.
pub async fn list_jobs(
    store: &dyn JobBoardStore,
    params: &[(String, String)],
) -> Result<(JobPage, Page), AppError> {
    let filter = Filter::<JobField>::from_pairs(params)?;
    let page = Page::from_pairs(params, JOBS_PER_PAGE);
    debug!(filter = %filter.to_document(), page = page.number, "listing jobs");

    let listing = store.list_job_summaries(&filter, page).await?;
    Ok((listing, page))
}

pub async fn update_job(
    store: &dyn JobBoardStore,
    id: Uuid,
    req: UpdateJobRequest,
) -> Result<JobRow, AppError> {
    let job_title = req
        .job_title
        .as_deref()
        .map(|t| non_blank("jobTitle", t))
        .transpose()?;
    let last_apply = req
        .last_apply
        .as_ref()
        .map(|v| v.resolve("lastApply"))
        .transpose()?;

    let update = JobUpdate {
        job_title,
        jd: req.jd,
        about_company: req.about_company,
        experience: req.experience,
        job_type: req.job_type,
        job_location: req.job_location,
        salary: req.salary,
        skills: req.skills,
        perks: req.perks,
        starting_date: req.starting_date,
        last_apply,
    };

    match store.update_job(id, update).await? {
        Some(job) => {
            info!(job_id = %id, "job updated");
            Ok(job)
        }
        None => {
            warn!(job_id = %id, "update of unknown job");
            Err(AppError::NotFound("Job not found".to_string()))
        }
    }
}

/// Deletes the job and its applications. Returns how many applications went with it.
pub async fn delete_job(store: &dyn JobBoardStore, id: Uuid) -> Result<u64, AppError> {
    match store.delete_job(id).await? {
        Some(removed) => {
            info!(job_id = %id, applications_removed = removed, "job deleted");
            Ok(removed)
        }
        None => {
            warn!(job_id = %id, "delete of unknown job");
            Err(AppError::NotFound("Job not found".to_string()))
        }
    }
}

pub async fn list_categories(store: &dyn JobBoardStore) -> Result<Vec<CategoryRow>, AppError> {
    store.list_categories().await
}
