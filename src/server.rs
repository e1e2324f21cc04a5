use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower_http::services::{ServeDir, ServeFile};

use crate::api::{ErrorBody, TodayTasksRequest, TodayTasksResponse};
use content_ops::cache::{CachedTasks, TaskCache};
use content_ops::config::AppConfig;
use content_ops::generation::GenerationClient;
use content_ops::kpi::{DashboardBuilder, KpiDashboard, RawDataBundle};
use content_ops::tasks::{
    merge_generated_tasks, DeriveTodayTasksInput, GenerationOutcome, TaskDeriver,
};
use content_ops::Error;

#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<DashboardBuilder>,
    deriver: Arc<TaskDeriver>,
    generation: Option<GenerationClient>,
    cache: Arc<TaskCache>,
}

impl AppState {
    pub async fn from_config(config: &AppConfig) -> content_ops::Result<Self> {
        let cache = TaskCache::load(config.cache.path.clone(), config.cache.ttl_secs).await?;
        Ok(Self {
            dashboard: Arc::new(DashboardBuilder::from_config(config)),
            deriver: Arc::new(TaskDeriver::new(config.tasks.clone())),
            generation: GenerationClient::from_config(&config.generation),
            cache: Arc::new(cache),
        })
    }
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn internal_error(err: Error) -> ApiError {
    tracing::error!(error = %err, "request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/kpi-dashboard", post(dashboard_handler))
        .route("/api/today-tasks", post(today_tasks_handler))
        .with_state(state)
}

pub async fn serve(args: crate::ServeArgs, config: AppConfig) -> content_ops::Result<()> {
    let state = AppState::from_config(&config).await?;
    if state.generation.is_none() {
        tracing::warn!("AI generation not configured: set AI_API_KEY to resolve requests");
    }

    let web_root = args.web_root;
    let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
    let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
    let app = router(state).fallback_service(static_service);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| Error::Config(format!("invalid bind address: {}", err)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "content-ops server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Json(bundle): Json<RawDataBundle>,
) -> Json<KpiDashboard> {
    Json(state.dashboard.build(&bundle))
}

async fn today_tasks_handler(
    State(state): State<AppState>,
    Json(request): Json<TodayTasksRequest>,
) -> Result<Json<TodayTasksResponse>, ApiError> {
    let user_id = request
        .user_id()
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, err))?;
    let now = request.now.unwrap_or_else(Utc::now);
    let date = request
        .date
        .clone()
        .unwrap_or_else(|| now.format("%Y-%m-%d").to_string());

    let derivation = state.deriver.derive(&DeriveTodayTasksInput {
        plan: request.plan.as_ref(),
        date: &date,
        timezone: request.timezone.as_deref().unwrap_or_default(),
        scheduled_posts: &request.scheduled_posts,
        now,
    });
    let warnings: Vec<String> = derivation.warnings.iter().map(|w| w.message()).collect();

    if !request.refresh.unwrap_or(false) {
        if let Some(hit) = state.cache.get(&user_id, derivation.date, now).await {
            tracing::debug!(%user_id, date = %derivation.date, "serving cached tasks");
            return Ok(Json(TodayTasksResponse {
                user_id,
                date: hit.date.to_string(),
                timezone: hit.derivation.timezone.clone(),
                tasks: hit.tasks.today,
                tomorrow: hit.tasks.tomorrow,
                derivation: hit.derivation,
                cached: true,
                warnings,
            }));
        }
    }

    let mut warnings = warnings;
    let outcomes = match (&state.generation, request.resolve_ai.unwrap_or(false)) {
        (Some(client), true) => {
            let requests: Vec<_> = derivation.all_requests().into_iter().cloned().collect();
            client.resolve_all(&requests).await
        }
        (None, true) => {
            warnings.push("AI generation not configured: set AI_API_KEY".to_string());
            HashMap::new()
        }
        _ => HashMap::new(),
    };

    let tasks = merge_generated_tasks(&derivation, &outcomes);
    if has_generated_content(&outcomes) {
        state
            .cache
            .put(CachedTasks {
                user_id: user_id.clone(),
                date: derivation.date,
                created_at: now,
                tasks: tasks.clone(),
                derivation: derivation.clone(),
            })
            .await
            .map_err(internal_error)?;
    }

    Ok(Json(TodayTasksResponse {
        user_id,
        date: derivation.date.to_string(),
        timezone: derivation.timezone.clone(),
        tasks: tasks.today,
        tomorrow: tasks.tomorrow,
        derivation,
        cached: false,
        warnings,
    }))
}

/// Only lists carrying at least one successful generation are cached, so a
/// failed batch is retried on the next request.
fn has_generated_content(outcomes: &HashMap<String, GenerationOutcome>) -> bool {
    outcomes
        .values()
        .any(|outcome| matches!(outcome, GenerationOutcome::Generated(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn test_app(dir: &tempfile::TempDir) -> Router {
        let mut config = AppConfig::default();
        config.cache.path = dir.path().join("cache.json");
        config.generation.api_key = None;
        router(AppState::from_config(&config).await.expect("state"))
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let response = test_app(&dir)
            .await
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_endpoint_scores_bundle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = serde_json::json!({
            "userId": "u1",
            "posts": [{"id": "p1", "postType": "feed", "hashtags": ["#foo #bar,baz"]}],
            "analytics": [{"postId": "p1", "likes": 20, "comments": 10, "reach": 200, "publishedTime": "08:15"}]
        });
        let (status, json) = post_json(test_app(&dir).await, "/api/kpi-dashboard", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["performance"]["score"], 51);
        assert_eq!(json["hashtagStats"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["timeSlots"]["slots"][0]["postsInRange"], 1);
    }

    #[tokio::test]
    async fn today_tasks_without_plan_returns_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = serde_json::json!({
            "userId": "u1",
            "date": "2024-05-06",
            "timezone": "Asia/Tokyo",
            "now": "2024-05-06T00:00:00Z"
        });
        let (status, json) = post_json(test_app(&dir).await, "/api/today-tasks", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cached"], false);
        assert!(json["derivation"]["fallbackRequest"].is_object());
        assert_eq!(json["tasks"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn today_tasks_requires_user_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (status, json) =
            post_json(test_app(&dir).await, "/api/today-tasks", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "userId is required");
    }

    #[tokio::test]
    async fn failed_generations_are_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.cache.path = dir.path().join("cache.json");
        config.generation.api_key = Some("test-key".to_string());
        config.generation.api_base = "http://127.0.0.1:1".to_string();
        config.generation.timeout_ms = 2_000;
        let app = router(AppState::from_config(&config).await.expect("state"));

        let body = serde_json::json!({
            "userId": "u1",
            "date": "2024-05-06",
            "timezone": "UTC",
            "now": "2024-05-06T00:00:00Z",
            "resolveAi": true
        });
        for _ in 0..2 {
            let (status, json) = post_json(app.clone(), "/api/today-tasks", body.clone()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["cached"], false);
            assert!(json["tasks"][0].get("content").is_none());
        }
        assert!(!config.cache.path.exists());
    }

    #[test]
    fn only_successful_batches_are_cacheable() {
        let mut outcomes = HashMap::new();
        assert!(!has_generated_content(&outcomes));
        outcomes.insert(
            "a".to_string(),
            GenerationOutcome::Failed {
                reason: "timed out".to_string(),
            },
        );
        assert!(!has_generated_content(&outcomes));
        outcomes.insert(
            "b".to_string(),
            GenerationOutcome::Generated(content_ops::tasks::GeneratedContent {
                content: "Draft".to_string(),
                ..Default::default()
            }),
        );
        assert!(has_generated_content(&outcomes));
    }
}
