//! In-memory `JobBoardStore`, used by tests and `STORE_BACKEND=memory`.
//!
//! All state lives behind one `RwLock`; every operation takes the lock once, so
//! multi-write operations are atomic with respect to each other.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
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
use crate::store::{ApplicationChange, ApplyOutcome, JobBoardStore};

#[derive(Default)]
struct Data {
    categories: HashMap<Uuid, CategoryRow>,
    jobs: HashMap<Uuid, JobRow>,
    applicants: HashMap<Uuid, ApplicantRow>,
    applications: HashMap<Uuid, ApplicationRow>,
    last_created: Option<DateTime<Utc>>,
}

impl Data {
    /// Strictly increasing creation timestamps keep newest-first ordering stable.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }

    fn counts_for(&self, job_id: Uuid) -> ApplicationCounts {
        let mut counts = ApplicationCounts::default();
        for app in self.applications.values().filter(|a| a.job_id == job_id) {
            counts.total_applications += 1;
            if app.is_scheduled {
                counts.total_scheduled += 1;
            }
            if app.status == ApplicationStatus::Rejected.as_str() {
                counts.total_rejected += 1;
            }
            if app.status == ApplicationStatus::Selected.as_str() {
                counts.total_selected += 1;
            }
        }
        counts
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip().max(0) as usize)
        .take(page.limit().max(0) as usize)
        .collect()
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Data>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobBoardStore for MemoryStore {
    async fn create_job(
        &self,
        category: NewCategory,
        job: NewJob,
    ) -> Result<(JobRow, CategoryRow), AppError> {
        let mut data = self.data.write().await;

        let existing = data
            .categories
            .values()
            .find(|c| c.slug == category.slug)
            .map(|c| c.id);
        let category_id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                let created_at = data.next_timestamp();
                data.categories.insert(
                    id,
                    CategoryRow {
                        id,
                        title: category.title.clone(),
                        slug: category.slug.clone(),
                        created_at,
                    },
                );
                id
            }
        };
        let category_row = match data.categories.get_mut(&category_id) {
            Some(row) => {
                row.title = category.title;
                row.clone()
            }
            None => return Err(anyhow::anyhow!("category {category_id} vanished").into()),
        };

        let created_at = data.next_timestamp();
        let row = JobRow {
            id: Uuid::new_v4(),
            job_title: job.job_title,
            jd: job.jd,
            about_company: job.about_company,
            experience: job.experience,
            job_type: job.job_type,
            job_location: job.job_location,
            salary: job.salary,
            skills: job.skills,
            perks: job.perks,
            starting_date: job.starting_date,
            last_apply: job.last_apply,
            category_id,
            created_at,
        };
        data.jobs.insert(row.id, row.clone());

        Ok((row, category_row))
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobDetail>, AppError> {
        let data = self.data.read().await;
        Ok(data.jobs.get(&id).map(|job| JobDetail {
            job: job.clone(),
            category: data.categories.get(&job.category_id).cloned(),
        }))
    }

    async fn list_job_summaries(
        &self,
        filter: &Filter<JobField>,
        page: Page,
    ) -> Result<JobPage, AppError> {
        let data = self.data.read().await;

        let mut matching: Vec<&JobRow> = data.jobs.values().filter(|j| filter.matches(*j)).collect();
        newest_first(&mut matching, |j| (j.created_at, j.id));
        let total = matching.len() as i64;

        let jobs = paginate(matching, page)
            .into_iter()
            .map(|job| JobSummary {
                job: job.clone(),
                category: data.categories.get(&job.category_id).cloned(),
                counts: data.counts_for(job.id),
            })
            .collect();

        Ok(JobPage { jobs, total })
    }

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<Option<JobRow>, AppError> {
        let mut data = self.data.write().await;
        let Some(job) = data.jobs.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(v) = update.job_title {
            job.job_title = v;
        }
        if let Some(v) = update.jd {
            job.jd = v;
        }
        if let Some(v) = update.about_company {
            job.about_company = v;
        }
        if update.experience.is_some() {
            job.experience = update.experience;
        }
        if update.job_type.is_some() {
            job.job_type = update.job_type;
        }
        if update.job_location.is_some() {
            job.job_location = update.job_location;
        }
        if update.salary.is_some() {
            job.salary = update.salary;
        }
        if let Some(v) = update.skills {
            job.skills = v;
        }
        if update.perks.is_some() {
            job.perks = update.perks;
        }
        if update.starting_date.is_some() {
            job.starting_date = update.starting_date;
        }
        if update.last_apply.is_some() {
            job.last_apply = update.last_apply;
        }

        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let mut data = self.data.write().await;
        if data.jobs.remove(&id).is_none() {
            return Ok(None);
        }
        let before = data.applications.len();
        data.applications.retain(|_, app| app.job_id != id);
        Ok(Some((before - data.applications.len()) as u64))
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRow>, AppError> {
        let data = self.data.read().await;
        let mut categories: Vec<CategoryRow> = data.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn create_applicant(
        &self,
        name: String,
        email: String,
    ) -> Result<ApplicantRow, AppError> {
        let mut data = self.data.write().await;
        let created_at = data.next_timestamp();
        let row = ApplicantRow {
            id: Uuid::new_v4(),
            name,
            email,
            my_jobs: Vec::new(),
            created_at,
        };
        data.applicants.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, AppError> {
        Ok(self.data.read().await.applicants.get(&id).cloned())
    }

    async fn apply(
        &self,
        applicant_id: Uuid,
        job_id: Uuid,
        details: Value,
    ) -> Result<ApplyOutcome, AppError> {
        let mut data = self.data.write().await;

        let Some(category_id) = data.jobs.get(&job_id).map(|j| j.category_id) else {
            return Ok(ApplyOutcome::JobNotFound);
        };
        let Some(applicant) = data.applicants.get_mut(&applicant_id) else {
            return Ok(ApplyOutcome::ApplicantNotFound);
        };
        if applicant.my_jobs.contains(&job_id) {
            return Ok(ApplyOutcome::AlreadyApplied);
        }
        applicant.my_jobs.push(job_id);

        let created_at = data.next_timestamp();
        let row = ApplicationRow {
            id: Uuid::new_v4(),
            applicant_id,
            job_id,
            category_id,
            status: ApplicationStatus::default().as_str().to_string(),
            is_scheduled: false,
            assigned_to: None,
            interview_time: None,
            salary_offered: None,
            details,
            is_deleted: false,
            created_at,
        };
        data.applications.insert(row.id, row.clone());

        Ok(ApplyOutcome::Applied(row))
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError> {
        Ok(self.data.read().await.applications.get(&id).cloned())
    }

    async fn schedule_interview(
        &self,
        id: Uuid,
        slot: &InterviewSlot,
    ) -> Result<Option<ApplicationRow>, AppError> {
        let mut data = self.data.write().await;
        Ok(data.applications.get_mut(&id).map(|app| {
            app.is_scheduled = true;
            app.assigned_to = Some(slot.interviewer.clone());
            app.interview_time = Some(slot.time);
            app.status = ApplicationStatus::Scheduled.as_str().to_string();
            app.clone()
        }))
    }

    async fn update_application(
        &self,
        id: Uuid,
        change: ApplicationChange,
    ) -> Result<Option<ApplicationRow>, AppError> {
        let mut data = self.data.write().await;
        Ok(data.applications.get_mut(&id).map(|app| {
            app.status = change.status.as_str().to_string();
            if change.salary_offered.is_some() {
                app.salary_offered = change.salary_offered;
            }
            app.clone()
        }))
    }

    async fn soft_delete_application(&self, id: Uuid) -> Result<bool, AppError> {
        let mut data = self.data.write().await;
        Ok(data
            .applications
            .get_mut(&id)
            .map(|app| app.is_deleted = true)
            .is_some())
    }

    async fn list_applications(
        &self,
        filter: &Filter<ApplicationField>,
        page: Page,
    ) -> Result<ApplicationPage, AppError> {
        let data = self.data.read().await;

        let mut matching: Vec<&ApplicationRow> = data
            .applications
            .values()
            .filter(|a| !a.is_deleted && filter.matches(*a))
            .collect();
        newest_first(&mut matching, |a| (a.created_at, a.id));
        let total = matching.len() as i64;

        let applications = paginate(matching, page)
            .into_iter()
            .map(|app| ApplicationDetail {
                application: app.clone(),
                job: data.jobs.get(&app.job_id).cloned(),
                applicant: data.applicants.get(&app.applicant_id).cloned(),
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
        let data = self.data.read().await;
        let mut rows: Vec<ApplicationRow> = data
            .applications
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id));
        Ok(rows)
    }
}
