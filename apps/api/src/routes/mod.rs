pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::applicants::handlers as applicants;
use crate::applications::handlers as applications;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_post_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/apply", post(jobs::handle_apply))
        .route("/api/v1/categories", get(jobs::handle_list_categories))
        // Applicants
        .route(
            "/api/v1/applicants",
            post(applicants::handle_register_applicant),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/me",
            get(applications::handle_my_applications),
        )
        .route(
            "/api/v1/applications/:id",
            put(applications::handle_update_application)
                .delete(applications::handle_withdraw_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_change_status),
        )
        .route(
            "/api/v1/applications/:id/interview",
            post(applications::handle_schedule_interview),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::caller::APPLICANT_HEADER;
    use crate::config::Config;
    use crate::notify::testing::RecordingMailer;
    use crate::store::MemoryStore;

    fn test_app() -> Router {
        build_router(AppState {
            store: Arc::new(MemoryStore::new()),
            mailer: Arc::new(RecordingMailer::default()),
            config: Config::in_memory(),
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        applicant: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = applicant {
            builder = builder.header(APPLICANT_HEADER, id);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post_job(app: &Router, title: &str, salary: i64) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/jobs",
            None,
            Some(json!({
                "jobTitle": title,
                "categoryTitle": "Software Engineering",
                "salary": salary,
                "skills": ["rust"],
                "lastApply": "2030-01-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["job"]["id"].as_str().unwrap().to_string()
    }

    async fn register(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/applicants",
            None,
            Some(json!({ "name": name, "email": format!("{name}@example.com") })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["applicant"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_post_and_get_job() {
        let app = test_app();
        let id = post_job(&app, "Backend Engineer", 60_000).await;

        let (status, body) =
            send(&app, Method::GET, &format!("/api/v1/jobs/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["job"]["jobTitle"], "Backend Engineer");
        assert_eq!(body["job"]["category"]["slug"], "software_engineering");
        assert_eq!(body["job"]["lastApply"], 1_893_456_000_000i64);
    }

    #[tokio::test]
    async fn test_unknown_job_is_404_with_error_body() {
        let app = test_app();
        let uri = format!("/api/v1/jobs/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Job not found" }));

        let (status, _) = send(&app, Method::PUT, &uri, None, Some(json!({ "salary": 1 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_400() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/api/v1/jobs/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_job_listing_page_and_range_filter() {
        let app = test_app();
        for i in 0..7 {
            post_job(&app, &format!("Engineer {i}"), 40_000 + i * 5_000).await;
        }

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/jobs?page=2&salary%5Bgte%5D=50000",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resultPerPage"], 4);
        // Salaries 50k..70k match: five jobs, one on the second page.
        assert_eq!(body["jobsCount"], 5);
        let jobs = body["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["jobTitle"], "Engineer 2");
        assert_eq!(jobs[0]["totalApplications"], 0);
        assert_eq!(jobs[0]["category"]["title"], "Software Engineering");
    }

    #[tokio::test]
    async fn test_job_listing_rejects_unknown_filter() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/api/v1/jobs?color=red", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_apply_flow_and_duplicate() {
        let app = test_app();
        let job = post_job(&app, "Backend Engineer", 60_000).await;
        let applicant = register(&app, "ana").await;
        let uri = format!("/api/v1/jobs/{job}/apply");
        let body = json!({ "coverLetter": "hi" });

        let (status, _) = send(&app, Method::POST, &uri, None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, resp) =
            send(&app, Method::POST, &uri, Some(&applicant), Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "Your application is registered");

        let (status, resp) = send(&app, Method::POST, &uri, Some(&applicant), Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(resp["success"], false);

        let (status, mine) = send(
            &app,
            Method::GET,
            "/api/v1/applications/me",
            Some(&applicant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let apps = mine["applications"].as_array().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0]["jobId"], job.as_str());
        assert_eq!(apps[0]["details"]["coverLetter"], "hi");
    }

    #[tokio::test]
    async fn test_apply_without_body() {
        let app = test_app();
        let job = post_job(&app, "Backend Engineer", 60_000).await;
        let applicant = register(&app, "ana").await;
        let uri = format!("/api/v1/jobs/{job}/apply");

        let (status, resp) = send(&app, Method::POST, &uri, Some(&applicant), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "Your application is registered");

        let (_, mine) = send(
            &app,
            Method::GET,
            "/api/v1/applications/me",
            Some(&applicant),
            None,
        )
        .await;
        assert_eq!(mine["applications"][0]["details"], json!({}));
    }

    #[tokio::test]
    async fn test_apply_with_non_object_body_is_400() {
        let app = test_app();
        let job = post_job(&app, "Backend Engineer", 60_000).await;
        let applicant = register(&app, "ana").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/jobs/{job}/apply"),
            Some(&applicant),
            Some(json!(["resume"])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_interview_status_and_admin_listing() {
        let app = test_app();
        let job = post_job(&app, "Backend Engineer", 60_000).await;
        let applicant = register(&app, "ana").await;
        send(
            &app,
            Method::POST,
            &format!("/api/v1/jobs/{job}/apply"),
            Some(&applicant),
            Some(json!({})),
        )
        .await;

        let (_, listing) = send(&app, Method::GET, "/api/v1/applications", None, None).await;
        assert_eq!(listing["resultPerPage"], 10);
        assert_eq!(listing["applicationCount"], 1);
        let application = listing["applications"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(listing["applications"][0]["applicant"]["name"], "ana");
        assert_eq!(listing["applications"][0]["job"]["id"], job.as_str());

        let (status, resp) = send(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{application}/interview"),
            None,
            Some(json!({ "interviewerName": "Bob", "interviewTime": "2024-05-01T08:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "Interview scheduled");

        let (_, listing) = send(
            &app,
            Method::GET,
            "/api/v1/applications?status=Scheduled",
            None,
            None,
        )
        .await;
        let scheduled = &listing["applications"][0];
        assert_eq!(scheduled["isScheduled"], true);
        assert_eq!(scheduled["assignedTo"], "Bob");
        assert_eq!(scheduled["interviewTime"], 1_714_550_400_000i64);

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/v1/applications/{application}/status"),
            None,
            Some(json!({ "status": "promoted" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, resp) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/applications/{application}"),
            None,
            Some(json!({ "status": "selected", "salary": 70000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "Application updated");

        let (_, jobs) = send(&app, Method::GET, "/api/v1/jobs", None, None).await;
        assert_eq!(jobs["jobs"][0]["totalApplications"], 1);
        assert_eq!(jobs["jobs"][0]["totalScheduled"], 1);
        assert_eq!(jobs["jobs"][0]["totalSelected"], 1);
        assert_eq!(jobs["jobs"][0]["totalRejected"], 0);
    }

    #[tokio::test]
    async fn test_delete_job_reports_cascade() {
        let app = test_app();
        let job = post_job(&app, "Backend Engineer", 60_000).await;
        for name in ["ana", "ben"] {
            let applicant = register(&app, name).await;
            send(
                &app,
                Method::POST,
                &format!("/api/v1/jobs/{job}/apply"),
                Some(&applicant),
                Some(json!({})),
            )
            .await;
        }

        let (status, body) =
            send(&app, Method::DELETE, &format!("/api/v1/jobs/{job}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applicationsRemoved"], 2);

        let (_, listing) = send(&app, Method::GET, "/api/v1/applications", None, None).await;
        assert_eq!(listing["applicationCount"], 0);
    }
}
