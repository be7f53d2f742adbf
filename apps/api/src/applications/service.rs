//! Application lifecycle: apply, schedule, status changes, listings.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    ApplicationPage, ApplicationRow, ApplicationStatus, InterviewSlot, ScheduleInterviewRequest,
    UpdateApplicationRequest,
};
use crate::notify::{interview_notices, Interviewer, Mailer};
use crate::query::fields::ApplicationField;
use crate::query::filter::Filter;
use crate::query::pagination::{Page, APPLICATIONS_PER_PAGE};
use crate::store::{ApplicationChange, ApplyOutcome, JobBoardStore};

/// Body keys owned by the server; an applicant cannot set them when applying.
const RESERVED_FIELDS: &[&str] = &[
    "id",
    "_id",
    "applicant",
    "applicantId",
    "job",
    "jobId",
    "category",
    "categoryId",
    "status",
    "isScheduled",
    "assignedTo",
    "interviewTime",
    "salaryOffered",
    "isDeleted",
    "createdAt",
];

/// Applies `applicant_id` to `job_id`. Extra body fields are stored as the
/// application's details.
pub async fn apply(
    store: &dyn JobBoardStore,
    applicant_id: Uuid,
    job_id: Uuid,
    mut fields: Map<String, Value>,
) -> Result<ApplicationRow, AppError> {
    fields.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));

    match store.apply(applicant_id, job_id, Value::Object(fields)).await? {
        ApplyOutcome::Applied(application) => {
            info!(
                application_id = %application.id,
                %applicant_id,
                %job_id,
                "application registered"
            );
            Ok(application)
        }
        ApplyOutcome::JobNotFound => Err(AppError::NotFound("Job not found".to_string())),
        ApplyOutcome::ApplicantNotFound => {
            Err(AppError::NotFound("Applicant not found".to_string()))
        }
        ApplyOutcome::AlreadyApplied => {
            warn!(%applicant_id, %job_id, "duplicate application rejected");
            Err(AppError::Conflict(
                "Already applied for this job".to_string(),
            ))
        }
    }
}

/// Assigns an interviewer and time, then notifies applicant and interviewer.
/// Notification failures are logged and do not fail the operation.
pub async fn schedule_interview(
    store: &dyn JobBoardStore,
    mailer: &dyn Mailer,
    mail_from: &str,
    id: Uuid,
    req: ScheduleInterviewRequest,
) -> Result<ApplicationRow, AppError> {
    let interviewer = req.interviewer_name.trim();
    if interviewer.is_empty() {
        return Err(AppError::Validation(
            "interviewerName cannot be empty".to_string(),
        ));
    }
    let slot = InterviewSlot {
        interviewer: interviewer.to_string(),
        time: req.interview_time.resolve("interviewTime")?,
    };
    let interviewer_email = match req.interviewer_email.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(address) if address.contains('@') => Some(address.to_string()),
        Some(address) => {
            return Err(AppError::Validation(format!(
                "interviewerEmail '{address}' is not an email address"
            )))
        }
    };

    let application = store
        .schedule_interview(id, &slot)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    info!(application_id = %id, interviewer = %slot.interviewer, "interview scheduled");

    notify_interview(
        store,
        mailer,
        mail_from,
        &application,
        &slot,
        interviewer_email.as_deref(),
    )
    .await;
    Ok(application)
}

async fn notify_interview(
    store: &dyn JobBoardStore,
    mailer: &dyn Mailer,
    mail_from: &str,
    application: &ApplicationRow,
    slot: &InterviewSlot,
    interviewer_email: Option<&str>,
) {
    let applicant = match store.get_applicant(application.applicant_id).await {
        Ok(Some(applicant)) => applicant,
        Ok(None) => {
            warn!(application_id = %application.id, "applicant missing; interview notice skipped");
            return;
        }
        Err(e) => {
            warn!(application_id = %application.id, "applicant lookup failed: {e}");
            return;
        }
    };
    let job_title = match store.get_job(application.job_id).await {
        Ok(Some(detail)) => detail.job.job_title,
        _ => "your application".to_string(),
    };

    if interviewer_email.is_none() {
        warn!(
            application_id = %application.id,
            interviewer = %slot.interviewer,
            "no interviewer address; interviewer notice skipped"
        );
    }

    let interviewer = Interviewer {
        name: &slot.interviewer,
        email: interviewer_email,
    };
    for mail in interview_notices(
        mail_from,
        &applicant.email,
        &applicant.name,
        interviewer,
        &job_title,
        slot.time,
    ) {
        let to = mail.to.clone();
        if let Err(e) = mailer.send(mail).await {
            warn!(application_id = %application.id, %to, "interview notice not sent: {e}");
        }
    }
}

/// Overwrites the status after validating it against the known statuses.
pub async fn change_status(
    store: &dyn JobBoardStore,
    id: Uuid,
    raw_status: &str,
) -> Result<ApplicationRow, AppError> {
    let status: ApplicationStatus = raw_status.parse()?;
    let change = ApplicationChange {
        status,
        salary_offered: None,
    };
    let application = store
        .update_application(id, change)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    info!(application_id = %id, %status, "application status changed");
    Ok(application)
}

/// Sets status and offered salary together.
pub async fn update_application(
    store: &dyn JobBoardStore,
    id: Uuid,
    req: UpdateApplicationRequest,
) -> Result<ApplicationRow, AppError> {
    let status: ApplicationStatus = req.status.parse()?;
    if matches!(req.salary, Some(s) if s < 0) {
        return Err(AppError::Validation(
            "salary cannot be negative".to_string(),
        ));
    }
    let change = ApplicationChange {
        status,
        salary_offered: req.salary,
    };
    let application = store
        .update_application(id, change)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    info!(application_id = %id, %status, "application updated");
    Ok(application)
}

/// Soft-deletes an application.
pub async fn withdraw(store: &dyn JobBoardStore, id: Uuid) -> Result<(), AppError> {
    if !store.soft_delete_application(id).await? {
        return Err(AppError::NotFound("Application not found".to_string()));
    }
    info!(application_id = %id, "application withdrawn");
    Ok(())
}

/// Admin listing: filtered, paginated, newest first, soft-deleted excluded.
pub async fn list_applications(
    store: &dyn JobBoardStore,
    params: &[(String, String)],
) -> Result<(ApplicationPage, Page), AppError> {
    let filter = Filter::<ApplicationField>::from_pairs(params)?;
    let page = Page::from_pairs(params, APPLICATIONS_PER_PAGE);
    debug!(filter = %filter.to_document(), page = page.number, "listing applications");

    let listing = store.list_applications(&filter, page).await?;
    Ok((listing, page))
}

pub async fn list_my_applications(
    store: &dyn JobBoardStore,
    applicant_id: Uuid,
) -> Result<Vec<ApplicationRow>, AppError> {
    store.list_applications_for_applicant(applicant_id).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::jobs::service::{delete_job, post_job};
    use crate::models::applicant::ApplicantRow;
    use crate::models::job::{JobDetail, PostJobRequest};
    use crate::notify::testing::{FailingMailer, RecordingMailer};
    use crate::store::MemoryStore;

    async fn seed_job(store: &MemoryStore, title: &str) -> JobDetail {
        let req: PostJobRequest = serde_json::from_value(json!({
            "jobTitle": title,
            "categoryTitle": "Engineering",
            "salary": 50000
        }))
        .unwrap();
        post_job(store, req).await.unwrap()
    }

    async fn seed_applicant(store: &MemoryStore, name: &str) -> ApplicantRow {
        store
            .create_applicant(name.to_string(), format!("{}@example.com", name.to_lowercase()))
            .await
            .unwrap()
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn schedule_request(name: &str, time: &str) -> ScheduleInterviewRequest {
        serde_json::from_value(json!({ "interviewerName": name, "interviewTime": time })).unwrap()
    }

    fn schedule_request_with_email(name: &str, email: &str, time: &str) -> ScheduleInterviewRequest {
        serde_json::from_value(json!({
            "interviewerName": name,
            "interviewerEmail": email,
            "interviewTime": time
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_apply_records_job_and_copies_category() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        assert!(applicant.my_jobs.is_empty());

        let application = apply(
            &store,
            applicant.id,
            job.job.id,
            fields(json!({ "coverLetter": "hello", "resume": "https://cv.example/ana" })),
        )
        .await
        .unwrap();

        assert_eq!(application.applicant_id, applicant.id);
        assert_eq!(application.job_id, job.job.id);
        assert_eq!(application.category_id, job.job.category_id);
        assert_eq!(application.status, "pending");
        assert_eq!(application.details["coverLetter"], "hello");

        let applicant = store.get_applicant(applicant.id).await.unwrap().unwrap();
        assert_eq!(applicant.my_jobs, vec![job.job.id]);
    }

    #[tokio::test]
    async fn test_second_apply_conflicts_without_new_application() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;

        apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();
        let second = apply(&store, applicant.id, job.job.id, Map::new()).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let mine = list_my_applications(&store, applicant.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        let applicant = store.get_applicant(applicant.id).await.unwrap().unwrap();
        assert_eq!(applicant.my_jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_to_missing_job_or_applicant() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;

        assert!(matches!(
            apply(&store, applicant.id, Uuid::new_v4(), Map::new()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            apply(&store, Uuid::new_v4(), job.job.id, Map::new()).await,
            Err(AppError::NotFound(_))
        ));
        let applicant = store.get_applicant(applicant.id).await.unwrap().unwrap();
        assert!(applicant.my_jobs.is_empty());
    }

    #[tokio::test]
    async fn test_apply_ignores_reserved_fields() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let intruder = Uuid::new_v4();

        let application = apply(
            &store,
            applicant.id,
            job.job.id,
            fields(json!({ "applicant": intruder.to_string(), "status": "selected", "note": "hi" })),
        )
        .await
        .unwrap();

        assert_eq!(application.applicant_id, applicant.id);
        assert_eq!(application.status, "pending");
        assert_eq!(application.details, json!({ "note": "hi" }));
    }

    #[tokio::test]
    async fn test_delete_job_cascades_to_its_applications() {
        let store = MemoryStore::new();
        let doomed = seed_job(&store, "Doomed").await;
        let kept = seed_job(&store, "Kept").await;
        let mut ids = Vec::new();
        for name in ["Ana", "Ben", "Cy"] {
            let applicant = seed_applicant(&store, name).await;
            let app = apply(&store, applicant.id, doomed.job.id, Map::new())
                .await
                .unwrap();
            ids.push(app.id);
            apply(&store, applicant.id, kept.job.id, Map::new())
                .await
                .unwrap();
        }

        assert_eq!(delete_job(&store, doomed.job.id).await.unwrap(), 3);
        for id in ids {
            assert!(store.get_application(id).await.unwrap().is_none());
        }
        let (rest, _) = list_applications(&store, &[]).await.unwrap();
        assert_eq!(rest.total, 3);
        assert!(rest
            .applications
            .iter()
            .all(|a| a.application.job_id == kept.job.id));
    }

    #[tokio::test]
    async fn test_schedule_interview_sets_fields_and_notifies() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let application = apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();
        let mailer = RecordingMailer::default();

        let scheduled = schedule_interview(
            &store,
            &mailer,
            "hr@example.com",
            application.id,
            schedule_request_with_email(" Bob ", "bob@example.com", "2024-05-01T08:00:00Z"),
        )
        .await
        .unwrap();

        assert_eq!(scheduled.status, "Scheduled");
        assert!(scheduled.is_scheduled);
        assert_eq!(scheduled.assigned_to.as_deref(), Some("Bob"));
        assert_eq!(
            scheduled.interview_time.unwrap().timestamp_millis(),
            1_714_550_400_000
        );

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "ana@example.com");
        assert!(sent[0].subject.contains("Backend"));
        assert_eq!(sent[1].to, "bob@example.com");
    }

    #[tokio::test]
    async fn test_schedule_without_interviewer_email_notifies_applicant_only() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let application = apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();
        let mailer = RecordingMailer::default();

        schedule_interview(
            &store,
            &mailer,
            "hr@example.com",
            application.id,
            schedule_request("Bob", "2024-05-01T08:00:00Z"),
        )
        .await
        .unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
    }

    #[tokio::test]
    async fn test_schedule_rejects_malformed_interviewer_email() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let application = apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();
        let mailer = RecordingMailer::default();

        let result = schedule_interview(
            &store,
            &mailer,
            "hr@example.com",
            application.id,
            schedule_request_with_email("Bob", "bob", "2024-05-01"),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let untouched = store.get_application(application.id).await.unwrap().unwrap();
        assert!(!untouched.is_scheduled);
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_survives_mail_failure() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let application = apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();

        let scheduled = schedule_interview(
            &store,
            &FailingMailer,
            "hr@example.com",
            application.id,
            schedule_request("Bob", "1714550400000"),
        )
        .await
        .unwrap();
        assert!(scheduled.is_scheduled);
    }

    #[tokio::test]
    async fn test_schedule_rejects_bad_input_and_unknown_application() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::default();
        let id = Uuid::new_v4();

        assert!(matches!(
            schedule_interview(&store, &mailer, "hr@x", id, schedule_request("  ", "2024-05-01")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            schedule_interview(&store, &mailer, "hr@x", id, schedule_request("Bob", "later")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            schedule_interview(&store, &mailer, "hr@x", id, schedule_request("Bob", "2024-05-01")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_change_status_validates() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let application = apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();

        let changed = change_status(&store, application.id, "SELECTED").await.unwrap();
        assert_eq!(changed.status, "selected");

        assert!(matches!(
            change_status(&store, application.id, "ghosted").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            change_status(&store, Uuid::new_v4(), "rejected").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_application_sets_status_and_salary() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let applicant = seed_applicant(&store, "Ana").await;
        let application = apply(&store, applicant.id, job.job.id, Map::new())
            .await
            .unwrap();

        let req: UpdateApplicationRequest =
            serde_json::from_value(json!({ "status": "selected", "salary": 72000 })).unwrap();
        let updated = update_application(&store, application.id, req).await.unwrap();
        assert_eq!(updated.status, "selected");
        assert_eq!(updated.salary_offered, Some(72_000));

        // Status-only change keeps the offer.
        let kept = change_status(&store, application.id, "shortlisted").await.unwrap();
        assert_eq!(kept.salary_offered, Some(72_000));
    }

    #[tokio::test]
    async fn test_job_listing_counts_each_bucket_independently() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let mailer = RecordingMailer::default();

        let mut apps = Vec::new();
        for name in ["Ana", "Ben", "Cy", "Di", "Ed"] {
            let applicant = seed_applicant(&store, name).await;
            apps.push(
                apply(&store, applicant.id, job.job.id, Map::new())
                    .await
                    .unwrap(),
            );
        }
        for app in &apps[..2] {
            schedule_interview(
                &store,
                &mailer,
                "hr@x",
                app.id,
                schedule_request("Bob", "2024-05-01"),
            )
            .await
            .unwrap();
        }
        change_status(&store, apps[2].id, "rejected").await.unwrap();
        change_status(&store, apps[3].id, "selected").await.unwrap();

        let (listing, _) = crate::jobs::service::list_jobs(&store, &[]).await.unwrap();
        let counts = listing.jobs[0].counts;
        assert_eq!(counts.total_applications, 5);
        assert_eq!(counts.total_scheduled, 2);
        assert_eq!(counts.total_rejected, 1);
        assert_eq!(counts.total_selected, 1);
    }

    #[tokio::test]
    async fn test_admin_listing_excludes_withdrawn_and_resolves_refs() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let ana = seed_applicant(&store, "Ana").await;
        let ben = seed_applicant(&store, "Ben").await;
        let first = apply(&store, ana.id, job.job.id, Map::new()).await.unwrap();
        let second = apply(&store, ben.id, job.job.id, Map::new()).await.unwrap();

        withdraw(&store, first.id).await.unwrap();

        let (listing, page) = list_applications(&store, &[]).await.unwrap();
        assert_eq!(page.per_page, 10);
        assert_eq!(listing.total, 1);
        let only = &listing.applications[0];
        assert_eq!(only.application.id, second.id);
        assert_eq!(only.job.as_ref().unwrap().id, job.job.id);
        assert_eq!(only.applicant.as_ref().unwrap().name, "Ben");

        // The applicant still sees their own withdrawn application.
        let mine = list_my_applications(&store, ana.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine[0].is_deleted);

        assert!(matches!(
            withdraw(&store, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_listing_filters_by_status() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let ana = seed_applicant(&store, "Ana").await;
        let ben = seed_applicant(&store, "Ben").await;
        let first = apply(&store, ana.id, job.job.id, Map::new()).await.unwrap();
        apply(&store, ben.id, job.job.id, Map::new()).await.unwrap();
        change_status(&store, first.id, "rejected").await.unwrap();

        let params = vec![("status".to_string(), "rejected".to_string())];
        let (listing, _) = list_applications(&store, &params).await.unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.applications[0].application.id, first.id);
    }

    #[tokio::test]
    async fn test_admin_status_filter_is_case_insensitive_and_validated() {
        let store = MemoryStore::new();
        let job = seed_job(&store, "Backend").await;
        let ana = seed_applicant(&store, "Ana").await;
        let rejected = apply(&store, ana.id, job.job.id, Map::new()).await.unwrap();
        change_status(&store, rejected.id, "rejected").await.unwrap();

        let mixed_case = vec![("status".to_string(), "Rejected".to_string())];
        let (listing, _) = list_applications(&store, &mixed_case).await.unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.applications[0].application.id, rejected.id);

        let unknown = vec![("status".to_string(), "ghosted".to_string())];
        assert!(matches!(
            list_applications(&store, &unknown).await,
            Err(AppError::Validation(_))
        ));
    }
}
