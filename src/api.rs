use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Stateless
        .route("/api/suggestions", post(handlers::suggest))
        .route("/api/inspiration", get(handlers::inspiration))
        // Session and profile
        .route("/api/session", get(handlers::session))
        .route(
            "/api/profile",
            get(handlers::get_profile)
                .post(handlers::create_profile)
                .patch(handlers::update_profile),
        )
        // Check-ins and stats
        .route(
            "/api/checkins",
            get(handlers::list_checkins).post(handlers::create_checkin),
        )
        .route("/api/checkins/latest", get(handlers::latest_checkin))
        .route("/api/stats", get(handlers::progress_stats))
        // Assignments
        .route(
            "/api/assignments",
            get(handlers::list_assignments).post(handlers::create_assignment),
        )
        .route("/api/assignments/board", get(handlers::board))
        .route("/api/assignments/upcoming", get(handlers::upcoming_assignments))
        .route("/api/assignments/focus", get(handlers::focus_assignments))
        .route(
            "/api/assignments/{id}",
            get(handlers::get_assignment)
                .patch(handlers::update_assignment)
                .delete(handlers::delete_assignment),
        )
        .route(
            "/api/assignments/{id}/subtasks",
            get(handlers::list_subtasks).post(handlers::create_subtask),
        )
        .route(
            "/api/assignments/{id}/progress",
            get(handlers::assignment_progress),
        )
        // Subtasks
        .route(
            "/api/subtasks/{id}",
            patch(handlers::update_subtask).delete(handlers::delete_subtask),
        )
        // Little wins
        .route(
            "/api/wins",
            get(handlers::list_wins).post(handlers::create_win),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "studyhaven listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::USER_ID_HEADER;
    use crate::memory::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        create_router(AppState::new(Arc::new(MemoryStore::new())))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
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

    async fn signed_up(app: &Router) -> Uuid {
        let user = Uuid::new_v4();
        let (status, _) = send(
            app,
            Method::POST,
            "/api/profile",
            Some(user),
            Some(json!({ "email": format!("{user}@example.edu") })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        user
    }

    #[tokio::test]
    async fn suggestions_return_two_plus_not_now() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/suggestions",
            None,
            Some(json!({ "mood": 3, "energy": 4, "focus": 3, "notes": "ok" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);
        assert_eq!(body["suggestions"][0]["id"], "momentum");
        assert!(body["not_now"]["message"].is_string());
        assert!(body["context"]["greeting"].is_string());
    }

    #[tokio::test]
    async fn crisis_ratings_return_single_suggestion() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/suggestions",
            None,
            Some(json!({ "mood": 1, "energy": 1, "focus": 5 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let suggestions = body["suggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["id"], "crisis-support");
    }

    #[tokio::test]
    async fn bad_ratings_are_rejected_with_400() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/suggestions",
            None,
            Some(json!({ "mood": 3, "energy": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required check-in data");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/suggestions",
            None,
            Some(json!({ "mood": 3, "energy": 7, "focus": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Ratings must be between 1 and 5");
    }

    #[tokio::test]
    async fn data_routes_require_a_user() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/assignments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn created_assignment_shows_up_in_list() {
        let app = app();
        let user = signed_up(&app).await;
        let due_at = Utc::now() + Duration::days(1);

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/assignments",
            Some(user),
            Some(json!({
                "course": "CS 301",
                "title": "Final Project",
                "due_at": due_at,
                "impact": 3,
                "est_minutes": 60
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, list) = send(&app, Method::GET, "/api/assignments", Some(user), None).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], created["id"]);
        assert_eq!(list[0]["course"], "CS 301");
        assert_eq!(list[0]["title"], "Final Project");
        assert_eq!(list[0]["impact"], 3);
        assert_eq!(list[0]["est_minutes"], 60);
        assert_eq!(list[0]["status"], "not_started");

        let (_, other) = send(
            &app,
            Method::GET,
            "/api/assignments",
            Some(Uuid::new_v4()),
            None,
        )
        .await;
        assert!(other.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn board_carries_subtask_progress() {
        let app = app();
        let user = signed_up(&app).await;
        let (_, assignment) = send(
            &app,
            Method::POST,
            "/api/assignments",
            Some(user),
            Some(json!({
                "course": "BIO 101",
                "title": "Lab Report",
                "due_at": Utc::now() + Duration::days(2),
                "impact": 4,
                "est_minutes": 90
            })),
        )
        .await;
        let id = assignment["id"].as_str().unwrap().to_string();

        let mut subtask_ids = Vec::new();
        for title in ["Collect data", "Write methods", "Write results"] {
            let (status, subtask) = send(
                &app,
                Method::POST,
                &format!("/api/assignments/{id}/subtasks"),
                Some(user),
                Some(json!({ "title": title })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            subtask_ids.push(subtask["id"].as_str().unwrap().to_string());
        }

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/subtasks/{}", subtask_ids[0]),
            Some(user),
            Some(json!({ "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, progress) = send(
            &app,
            Method::GET,
            &format!("/api/assignments/{id}/progress"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(progress, json!({ "completed": 1, "total": 3, "percentage": 33 }));

        let (status, board) = send(&app, Method::GET, "/api/assignments/board", Some(user), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["active"][0]["title"], "Lab Report");
        assert_eq!(board["active"][0]["progress"]["percentage"], 33);
        assert_eq!(board["course_suggestions"], json!(["BIO 101"]));
    }

    #[tokio::test]
    async fn status_patch_is_idempotent() {
        let app = app();
        let user = signed_up(&app).await;
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/assignments",
            Some(user),
            Some(json!({
                "course": "CS 301",
                "title": "Final Project",
                "description": "Ship it",
                "due_at": Utc::now() + Duration::days(1),
                "impact": 3,
                "est_minutes": 60,
                "status": "in_progress"
            })),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/api/assignments/{id}"),
            Some(user),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        for field in ["course", "title", "description", "due_at", "impact", "est_minutes", "status"] {
            assert_eq!(updated[field], created[field], "{field} changed");
        }
    }

    #[tokio::test]
    async fn checkins_feed_stats_and_streak() {
        let app = app();
        let user = signed_up(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/checkins",
            Some(user),
            Some(json!({ "mood": 4, "energy": 2, "focus": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/checkins",
            Some(user),
            Some(json!({ "mood": 0, "energy": 2, "focus": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/wins",
            Some(user),
            Some(json!({ "category": "self_care", "description": "Went for a walk" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, stats) = send(&app, Method::GET, "/api/stats", Some(user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["checkins"], 1);
        assert_eq!(stats["wins"], 1);
        assert_eq!(stats["completed"], 0);
        assert_eq!(stats["streak"], 1);
        assert_eq!(stats["averages"]["mood"], 4.0);

        let (_, latest) = send(&app, Method::GET, "/api/checkins/latest", Some(user), None).await;
        assert_eq!(latest["message"], "You just checked in");
    }

    #[tokio::test]
    async fn session_reports_profile_setup() {
        let app = app();
        let user = Uuid::new_v4();

        let (_, session) = send(&app, Method::GET, "/api/session", Some(user), None).await;
        assert_eq!(session["needs_profile_setup"], true);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/profile",
            Some(user),
            Some(json!({ "email": "sam@example.edu" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, profile) = send(
            &app,
            Method::PATCH,
            "/api/profile",
            Some(user),
            Some(json!({
                "full_name": "Sam Rivera",
                "school": "State University",
                "academic_year": "sophomore"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["academic_year"], "sophomore");

        let (_, session) = send(&app, Method::GET, "/api/session", Some(user), None).await;
        assert_eq!(session["needs_profile_setup"], false);
    }

    #[tokio::test]
    async fn deleting_someone_elses_assignment_is_not_found() {
        let app = app();
        let owner = signed_up(&app).await;
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/assignments",
            Some(owner),
            Some(json!({
                "course": "CS 301",
                "title": "Final Project",
                "due_at": Utc::now() + Duration::days(1),
                "impact": 3,
                "est_minutes": 60
            })),
        )
        .await;
        let uri = format!("/api/assignments/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::DELETE, &uri, Some(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn writes_before_profile_setup_are_not_found() {
        let app = app();
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/assignments",
            Some(user),
            Some(json!({
                "course": "CS 301",
                "title": "Final Project",
                "due_at": Utc::now() + Duration::days(1),
                "impact": 3,
                "est_minutes": 60
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "profile not found");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/checkins",
            Some(user),
            Some(json!({ "mood": 3, "energy": 3, "focus": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn huge_day_windows_are_capped() {
        let app = app();
        let user = signed_up(&app).await;

        for uri in [
            "/api/checkins?days=100000000",
            "/api/wins?days=9223372036854775807",
            "/api/checkins?days=-9223372036854775808",
        ] {
            let (status, body) = send(&app, Method::GET, uri, Some(user), None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(body.as_array().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn bad_query_params_get_json_errors() {
        let app = app();
        let user = signed_up(&app).await;

        for uri in [
            "/api/assignments?sort=alphabetical",
            "/api/assignments/board?sort=soonest",
            "/api/checkins?days=week",
            "/api/wins?days=1.5",
        ] {
            let (status, body) = send(&app, Method::GET, uri, Some(user), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], 400);
            assert!(body["error"].is_string());
        }
    }
}
