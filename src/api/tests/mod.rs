use super::*;
use crate::config::{DatabaseConfig, ProviderConfig};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::tempdir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to build a router backed by a temp store and a mock provider
async fn create_test_router(
    server: &MockServer,
    api_key: Option<&str>,
) -> (Router, Arc<SongForge>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = Config {
        provider: ProviderConfig {
            api_key: api_key.map(str::to_string),
            api_host: server.uri(),
            ..Default::default()
        },
        database: DatabaseConfig {
            path: dir.path().join("test.db"),
        },
        ..Default::default()
    };

    let forge = Arc::new(SongForge::new(config.clone()).await.unwrap());
    let router = create_router(forge.clone(), Arc::new(config));
    (router, forge, dir)
}

async fn mount_accepting_provider(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "msg": "success",
            "data": {"taskId": task_id}
        })))
        .mount(server)
        .await;
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn submit_song_returns_task_id_and_provider() {
    let server = MockServer::start().await;
    mount_accepting_provider(&server, "T1").await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/songs",
            json!({"title": "A", "lyrics": "L", "style": "March"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["task_id"], "T1");
    assert_eq!(body["provider"], "kie");
}

#[tokio::test]
async fn submit_without_credential_is_500_config_error() {
    let server = MockServer::start().await;
    // Never hit when the credential is missing
    Mock::given(method("POST"))
        .and(path("/api/v1/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (router, forge, _dir) = create_test_router(&server, None).await;

    let response = router
        .oneshot(json_request("POST", "/songs", json!({"lyrics": "L"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "config_error");

    // No task record was created on the failure path
    assert!(
        forge
            .db
            .get_task(&crate::types::TaskId::from("T1"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn submit_connection_failure_is_502() {
    // Bind and immediately drop a listener so the port is refused
    let refused_addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let dir = tempdir().unwrap();
    let config = Config {
        provider: ProviderConfig {
            api_key: Some("test-key".to_string()),
            api_host: format!("http://{}", refused_addr),
            ..Default::default()
        },
        database: DatabaseConfig {
            path: dir.path().join("test.db"),
        },
        ..Default::default()
    };
    let forge = Arc::new(SongForge::new(config.clone()).await.unwrap());
    let router = create_router(forge, Arc::new(config));

    let response = router
        .oneshot(json_request("POST", "/songs", json!({"lyrics": "L"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "connection_failed");
}

#[tokio::test]
async fn status_of_unknown_task_is_processing() {
    let server = MockServer::start().await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/songs/never-issued/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "PROCESSING");
}

#[tokio::test]
async fn callback_then_status_serves_success() {
    let server = MockServer::start().await;
    mount_accepting_provider(&server, "T1").await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/songs",
            json!({"title": "A", "lyrics": "L", "style": "March"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Poll before the callback
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/songs/T1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["status"], "PROCESSING");
    assert_eq!(body["title"], "A");

    // Provider delivers the final callback
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/provider/callback",
            json!({
                "code": 200,
                "data": {
                    "task_id": "T1",
                    "data": [{"audio_url": "https://cdn.example.com/a.mp3"}]
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["code"], 200);

    // Poll after the callback
    let response = router
        .oneshot(
            Request::builder()
                .uri("/songs/T1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["audio_url"], "https://cdn.example.com/a.mp3");
    assert_eq!(body["title"], "A");
    assert_eq!(body["lyrics"], "L");
    assert_eq!(body["style"], "March");
}

#[tokio::test]
async fn non_final_callback_keeps_status_processing() {
    let server = MockServer::start().await;
    mount_accepting_provider(&server, "T1").await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    router
        .clone()
        .oneshot(json_request("POST", "/songs", json!({"lyrics": "L"})))
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/provider/callback",
            json!({
                "data": {
                    "task_id": "T1",
                    "data": [{"audio_url": "https://provider.example.com/preview/xyz"}]
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/songs/T1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["status"], "PROCESSING");
    assert!(body.get("audio_url").is_none());
}

#[tokio::test]
async fn partial_callback_is_acknowledged_success() {
    let server = MockServer::start().await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .oneshot(json_request(
            "POST",
            "/provider/callback",
            json!({"data": {"task_id": "T1", "data": []}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["code"], 200);
}

#[tokio::test]
async fn unparsable_callback_is_acknowledged_failure() {
    let server = MockServer::start().await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/provider/callback")
                .header("content-type", "application/json")
                .body(Body::from("this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["code"], 500);
}

#[tokio::test]
async fn status_with_user_header_reports_unlocked_achievements_once() {
    let server = MockServer::start().await;
    mount_accepting_provider(&server, "T1").await;

    let dir = tempdir().unwrap();
    let config = Config {
        provider: ProviderConfig {
            api_key: Some("test-key".to_string()),
            api_host: server.uri(),
            ..Default::default()
        },
        database: DatabaseConfig {
            path: dir.path().join("test.db"),
        },
        ..Default::default()
    };

    struct UnlockingHook;

    #[async_trait::async_trait]
    impl crate::hooks::CreationHook for UnlockingHook {
        async fn record_creation(
            &self,
            _creation: &crate::hooks::RecordedCreation,
        ) -> std::result::Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(vec!["First Song".to_string()])
        }
    }

    let forge = Arc::new(
        SongForge::with_hook(config.clone(), Arc::new(UnlockingHook))
            .await
            .unwrap(),
    );
    let router = create_router(forge, Arc::new(config));

    router
        .clone()
        .oneshot(json_request("POST", "/songs", json!({"lyrics": "L"})))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(json_request(
            "POST",
            "/provider/callback",
            json!({
                "data": {
                    "task_id": "T1",
                    "data": [{"audio_url": "https://cdn.example.com/a.mp3"}]
                }
            }),
        ))
        .await
        .unwrap();

    let status_request = || {
        Request::builder()
            .uri("/songs/T1/status")
            .header("x-user-id", "alice")
            .body(Body::empty())
            .unwrap()
    };

    let body = response_json(router.clone().oneshot(status_request()).await.unwrap()).await;
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["newly_unlocked"][0], "First Song");

    // A repeated poll does not re-record the creation
    let body = response_json(router.oneshot(status_request()).await.unwrap()).await;
    assert_eq!(body["status"], "SUCCESS");
    assert!(body.get("newly_unlocked").is_none());
}

#[tokio::test]
async fn health_check_returns_ok() {
    let server = MockServer::start().await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let server = MockServer::start().await;
    let (router, _forge, _dir) = create_test_router(&server, Some("test-key")).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"].get("/songs").is_some());
}

#[tokio::test]
async fn api_server_spawns_and_binds() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let mut config = Config {
        provider: ProviderConfig {
            api_key: Some("test-key".to_string()),
            api_host: server.uri(),
            ..Default::default()
        },
        database: DatabaseConfig {
            path: dir.path().join("test.db"),
        },
        ..Default::default()
    };
    // Port 0 = OS assigns a free port
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let forge = Arc::new(SongForge::new((*config).clone()).await.unwrap());

    let api_handle = tokio::spawn({
        let forge = forge.clone();
        let config = config.clone();
        async move { start_api_server(forge, config).await }
    });

    // Give it a moment to start, then abort
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    api_handle.abort();
}
