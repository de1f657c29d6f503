use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use careers_backend::dto::job_dto::CreateJobPayload;
use careers_backend::dto::user_dto::CreateUserPayload;
use careers_backend::middleware::auth::issue_token;
use careers_backend::models::user::Role;
use careers_backend::models::user_group::PermissionMap;
use careers_backend::{routes, AppState};

async fn setup() -> AppState {
    careers_backend::config::init_config_for_tests();
    let pool = careers_backend::database::pool::connect("sqlite::memory:")
        .await
        .expect("pool");
    careers_backend::database::schema::init(&pool)
        .await
        .expect("schema");
    AppState::new(pool)
}

fn app(state: AppState) -> Router {
    let public = Router::new().route(
        "/api/public/applications",
        post(routes::applications::apply),
    );
    let authed = Router::new()
        .route(
            "/api/applications",
            get(routes::applications::list_applications),
        )
        .route(
            "/api/applications/:id",
            get(routes::applications::get_application),
        )
        .route(
            "/api/applications/:id/status",
            post(routes::applications::update_status),
        )
        .route(
            "/api/applications/:id/withdraw",
            post(routes::applications::withdraw),
        )
        .layer(axum::middleware::from_fn(
            careers_backend::middleware::auth::require_bearer_auth,
        ));
    public.merge(authed).with_state(state)
}

async fn seed_active_job(state: &AppState, title: &str) -> i64 {
    let recruiter = state
        .user_service
        .create(CreateUserPayload {
            name: format!("Recruiter for {}", title),
            email: format!("recruiter+{}@example.com", title.replace(' ', "_")),
            phone: None,
            city: None,
            role: Some("admin".to_string()),
            group_id: None,
            password: None,
        })
        .await
        .expect("recruiter");
    let job = state
        .job_service
        .create(
            CreateJobPayload {
                title: title.to_string(),
                department: Some("Nursing".to_string()),
                location: None,
                employment_type: Some("full_time".to_string()),
                salary_min: None,
                salary_max: None,
                description: Some("Critical care nursing in the ICU.".to_string()),
                qualifications: Some("nursing critical care certification".to_string()),
                experience_level: Some("senior".to_string()),
                status: Some("active".to_string()),
            },
            recruiter.id,
        )
        .await
        .expect("job");
    job.id
}

fn apply_body(job_id: i64, email: &str) -> JsonValue {
    json!({
        "job_id": job_id,
        "name": "Jane Doe",
        "email": email,
        "phone": "+91 98765 43210",
        "experience": [
            {
                "title": "Senior Critical Care Nurse",
                "company": "City Hospital",
                "start_date": "2021-01",
                "is_current": true,
                "description": "Nursing in critical care with certification."
            }
        ],
        "education": [
            { "degree": "BSc Nursing", "institution": "State University", "end_year": 2018 }
        ]
    })
}

async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: JsonValue) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

async fn get_json(app: &Router, uri: &str, token: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

#[tokio::test]
async fn one_active_application_per_candidate() {
    let state = setup().await;
    let job_a = seed_active_job(&state, "ICU Nurse").await;
    let job_b = seed_active_job(&state, "Ward Nurse").await;
    let app = app(state.clone());

    let (status, body) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_a, "jane@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "new");

    // Second application while the first is live, even for another job.
    let (status, _) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_b, "jane@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_applications")
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(count, 1, "the rejected submission must not leave a row behind");

    // Withdrawing frees the slot.
    let application_id = body["id"].as_i64().unwrap();
    let candidate_id = body["user_id"].as_i64().unwrap();
    let candidate_token =
        issue_token(candidate_id, Role::Candidate, PermissionMap::default()).unwrap();
    let (status, withdrawn) = post_json(
        &app,
        &format!("/api/applications/{}/withdraw", application_id),
        Some(&candidate_token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(withdrawn["status"], "withdrawn");

    let (status, _) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_b, "jane@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn applying_to_a_draft_job_is_rejected() {
    let state = setup().await;
    let job_id = seed_active_job(&state, "Lab Technician").await;
    sqlx::query("UPDATE jobs SET status = 'draft' WHERE id = ?")
        .bind(job_id)
        .execute(&state.pool)
        .await
        .unwrap();
    let app = app(state);

    let (status, _) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_id, "draft@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn score_is_computed_once_and_cached() {
    let state = setup().await;
    let job_id = seed_active_job(&state, "Critical Care Nurse").await;
    let app = app(state.clone());

    let (_, created) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_id, "score@example.com"),
    )
    .await;
    let application_id = created["id"].as_i64().unwrap();
    assert_eq!(created["score"], 0.0);

    let admin_token = issue_token(1, Role::Superadmin, PermissionMap::default()).unwrap();
    let (status, detail) = get_json(
        &app,
        &format!("/api/applications/{}", application_id),
        &admin_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let score = detail["application"]["score"].as_f64().unwrap();
    assert!(score > 0.0, "matching profile must score above zero");

    let stored: f64 = sqlx::query_scalar("SELECT score FROM job_applications WHERE id = ?")
        .bind(application_id)
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(stored, score);

    // Second read serves the cached value.
    let (_, again) = get_json(
        &app,
        &format!("/api/applications/{}", application_id),
        &admin_token,
    )
    .await;
    assert_eq!(again["application"]["score"].as_f64().unwrap(), score);
}

#[tokio::test]
async fn status_moves_are_validated_and_audited() {
    let state = setup().await;
    let job_id = seed_active_job(&state, "Radiographer").await;
    let app = app(state.clone());

    let (_, created) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_id, "audit@example.com"),
    )
    .await;
    let application_id = created["id"].as_i64().unwrap();
    let admin_token = issue_token(1, Role::Superadmin, PermissionMap::default()).unwrap();

    let (status, moved) = post_json(
        &app,
        &format!("/api/applications/{}/status", application_id),
        Some(&admin_token),
        json!({"status": "reviewed", "note": "looks promising"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], "reviewed");

    // Backwards is refused.
    let (status, _) = post_json(
        &app,
        &format!("/api/applications/{}/status", application_id),
        Some(&admin_token),
        json!({"status": "new"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        &format!("/api/applications/{}/status", application_id),
        Some(&admin_token),
        json!({"status": "rejected"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Terminal states absorb.
    let (status, _) = post_json(
        &app,
        &format!("/api/applications/{}/status", application_id),
        Some(&admin_token),
        json!({"status": "interview"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // One audit row per accepted move, plus the submission event.
    let (_, detail) = get_json(
        &app,
        &format!("/api/applications/{}", application_id),
        &admin_token,
    )
    .await;
    let events = detail["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["to_status"], "new");
    assert_eq!(events[1]["to_status"], "reviewed");
    assert_eq!(events[1]["note"], "looks promising");
    assert_eq!(events[2]["to_status"], "rejected");
}

#[tokio::test]
async fn withdraw_requires_ownership() {
    let state = setup().await;
    let job_id = seed_active_job(&state, "Pharmacist").await;
    let app = app(state.clone());

    let (_, created) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_id, "owner@example.com"),
    )
    .await;
    let application_id = created["id"].as_i64().unwrap();

    let stranger_token = issue_token(9999, Role::Candidate, PermissionMap::default()).unwrap();
    let (status, _) = post_json(
        &app,
        &format!("/api/applications/{}/withdraw", application_id),
        Some(&stranger_token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn repeat_application_refreshes_profile_rows() {
    let state = setup().await;
    let job_id = seed_active_job(&state, "Dietician").await;
    let app = app(state.clone());

    let (_, created) = post_json(
        &app,
        "/api/public/applications",
        None,
        apply_body(job_id, "profile@example.com"),
    )
    .await;
    let application_id = created["id"].as_i64().unwrap();
    let candidate_id = created["user_id"].as_i64().unwrap();
    let token = issue_token(candidate_id, Role::Candidate, PermissionMap::default()).unwrap();
    post_json(
        &app,
        &format!("/api/applications/{}/withdraw", application_id),
        Some(&token),
        json!({}),
    )
    .await;

    // Re-apply with a different experience set; the old rows are replaced,
    // not appended.
    let mut body = apply_body(job_id, "profile@example.com");
    body["experience"] = json!([
        {"title": "Head Dietician", "company": "General Hospital", "is_current": true}
    ]);
    let (status, _) = post_json(&app, "/api/public/applications", None, body).await;
    assert_eq!(status, StatusCode::CREATED);

    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT title FROM candidate_experience WHERE user_id = ?")
            .bind(candidate_id)
            .fetch_all(&state.pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "Head Dietician");
}
