use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode as HttpStatus},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::domain::{ConfigId, DEFAULT_API_VERSION};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    configs: Arc<Mutex<HashMap<String, ConfigRecord>>>,
    saved_bodies: Arc<Mutex<Vec<SaveConfigRequest>>>,
    authorization: Arc<Mutex<Vec<Option<String>>>>,
    reject_saves_with: Option<String>,
    reject_tests_with: Option<String>,
}

impl ServerState {
    async fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.authorization.lock().await.push(value);
    }
}

async fn handle_get_config(
    State(state): State<ServerState>,
    Path(business_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record_auth(&headers).await;
    match state.configs.lock().await.get(&business_id) {
        Some(record) => (HttpStatus::OK, Json(Envelope::ok(Some(record.clone())))),
        None => (
            HttpStatus::NOT_FOUND,
            Json(Envelope::<ConfigRecord>::failed("Shopify integration not found")),
        ),
    }
}

async fn handle_save_config(
    State(state): State<ServerState>,
    Path(business_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SaveConfigRequest>,
) -> impl IntoResponse {
    state.record_auth(&headers).await;
    state.saved_bodies.lock().await.push(body.clone());
    if let Some(error) = &state.reject_saves_with {
        return (
            HttpStatus::BAD_REQUEST,
            Json(Envelope::<ConfigRecord>::failed(error.clone())),
        );
    }

    let mut configs = state.configs.lock().await;
    let previous_token = configs
        .get(&business_id)
        .and_then(|record| record.access_token.clone());
    let access_token = if body.access_token.is_empty() {
        previous_token
    } else {
        Some(body.access_token)
    };
    let record = ConfigRecord {
        id: Some(ConfigId::from("1")),
        business_id: BusinessId::new(business_id.clone()),
        store_url: body.store_url,
        access_token,
        api_version: body
            .api_version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        is_active: true,
        created_at: None,
        updated_at: None,
    };
    configs.insert(business_id, record.clone());
    (HttpStatus::OK, Json(Envelope::ok(Some(record))))
}

async fn handle_delete_config(
    State(state): State<ServerState>,
    Path(business_id): Path<String>,
) -> impl IntoResponse {
    state.configs.lock().await.remove(&business_id);
    Json(Envelope::<()>::ok(None).with_message("Shopify integration removed"))
}

async fn handle_test_connection(
    State(state): State<ServerState>,
    Path(business_id): Path<String>,
) -> impl IntoResponse {
    if let Some(error) = &state.reject_tests_with {
        return Json(Envelope::<()>::failed(error.clone()));
    }
    match state.configs.lock().await.get(&business_id) {
        Some(record) => Json(
            Envelope::<()>::ok(None).with_message(format!("Connected to {}", record.store_url)),
        ),
        None => Json(Envelope::<()>::failed("Shopify integration not configured")),
    }
}

async fn spawn_config_server(state: ServerState) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route(
            "/shopify/config/:business_id",
            get(handle_get_config)
                .post(handle_save_config)
                .delete(handle_delete_config),
        )
        .route("/shopify/test/:business_id", get(handle_test_connection))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_raw_server(status: HttpStatus, body: &'static str) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().fallback(move || async move { (status, body) });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn draft(store_url: &str, token: &str) -> ConfigDraft {
    ConfigDraft {
        store_url: store_url.to_string(),
        access_token: SecretString::from(token.to_string()),
        api_version: DEFAULT_API_VERSION.to_string(),
    }
}

#[test]
fn rejects_unparseable_base_url() {
    let err = IntegrationClient::new("not a url").expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
}

#[test]
fn debug_output_redacts_api_token() {
    let client = IntegrationClient::new("http://127.0.0.1:1")
        .expect("client")
        .with_api_token(SecretString::from("super-secret".to_string()));
    assert!(!format!("{client:?}").contains("super-secret"));
}

#[tokio::test]
async fn missing_config_is_reported_as_rejection_not_fault() {
    let server_url = spawn_config_server(ServerState::default()).await;
    let client = IntegrationClient::new(&server_url).expect("client");

    let outcome = client
        .get_config(&BusinessId::from("biz-1"))
        .await
        .expect("no transport fault");

    assert_eq!(
        outcome,
        RemoteOutcome::Rejected {
            error: Some("Shopify integration not found".to_string())
        }
    );
}

#[tokio::test]
async fn save_then_get_returns_summary_for_saved_store() {
    let state = ServerState::default();
    let server_url = spawn_config_server(state.clone()).await;
    let client = IntegrationClient::new(&server_url).expect("client");
    let business_id = BusinessId::from("biz-1");

    let saved = client
        .save_config(&business_id, &draft("https://a.myshopify.com/", "shpat_x"))
        .await
        .expect("save");
    assert!(saved.is_accepted());

    let bodies = state.saved_bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].store_url, "a.myshopify.com");
    assert_eq!(bodies[0].access_token, "shpat_x");
    assert_eq!(bodies[0].api_version.as_deref(), Some(DEFAULT_API_VERSION));
    drop(bodies);

    let fetched = client.get_config(&business_id).await.expect("get");
    let RemoteOutcome::Accepted {
        data: Some(summary),
        ..
    } = &fetched
    else {
        panic!("expected stored config, got {fetched:?}");
    };
    assert_eq!(summary.store_url, "a.myshopify.com");
    assert_eq!(summary.api_version, DEFAULT_API_VERSION);
    assert_eq!(summary.config_id, Some(ConfigId::from("1")));
}

#[tokio::test]
async fn blank_token_is_forwarded_so_server_keeps_existing_one() {
    let state = ServerState::default();
    let server_url = spawn_config_server(state.clone()).await;
    let client = IntegrationClient::new(&server_url).expect("client");
    let business_id = BusinessId::from("biz-1");

    client
        .save_config(&business_id, &draft("a.myshopify.com", "shpat_x"))
        .await
        .expect("first save");
    client
        .save_config(&business_id, &draft("b.myshopify.com", ""))
        .await
        .expect("second save");

    assert_eq!(state.saved_bodies.lock().await[1].access_token, "");
    let stored = state.configs.lock().await.get("biz-1").cloned().expect("row");
    assert_eq!(stored.store_url, "b.myshopify.com");
    assert_eq!(stored.access_token.as_deref(), Some("shpat_x"));
}

#[tokio::test]
async fn structured_save_failure_keeps_server_error_text() {
    let state = ServerState {
        reject_saves_with: Some("bad token".to_string()),
        ..ServerState::default()
    };
    let server_url = spawn_config_server(state).await;
    let client = IntegrationClient::new(&server_url).expect("client");

    let outcome = client
        .save_config(&BusinessId::from("biz-1"), &draft("a.myshopify.com", "nope"))
        .await
        .expect("structured failure is not a fault");

    assert_eq!(
        outcome,
        RemoteOutcome::Rejected {
            error: Some("bad token".to_string())
        }
    );
}

#[tokio::test]
async fn delete_removes_config_and_forwards_message() {
    let state = ServerState::default();
    let server_url = spawn_config_server(state.clone()).await;
    let client = IntegrationClient::new(&server_url).expect("client");
    let business_id = BusinessId::from("biz-1");
    client
        .save_config(&business_id, &draft("a.myshopify.com", "shpat_x"))
        .await
        .expect("save");

    let outcome = client.delete_config(&business_id).await.expect("delete");
    assert_eq!(
        outcome,
        RemoteOutcome::Accepted {
            data: (),
            message: Some("Shopify integration removed".to_string())
        }
    );
    assert!(!client
        .get_config(&business_id)
        .await
        .expect("get")
        .is_accepted());
}

#[tokio::test]
async fn test_connection_reports_success_message_and_failure_error() {
    let state = ServerState::default();
    let server_url = spawn_config_server(state.clone()).await;
    let client = IntegrationClient::new(&server_url).expect("client");
    let business_id = BusinessId::from("biz-1");

    let missing = client.test_connection(&business_id).await.expect("test");
    assert_eq!(
        missing,
        RemoteOutcome::Rejected {
            error: Some("Shopify integration not configured".to_string())
        }
    );

    client
        .save_config(&business_id, &draft("a.myshopify.com", "shpat_x"))
        .await
        .expect("save");
    let connected = client.test_connection(&business_id).await.expect("test");
    assert_eq!(
        connected,
        RemoteOutcome::Accepted {
            data: (),
            message: Some("Connected to a.myshopify.com".to_string())
        }
    );
}

#[tokio::test]
async fn attaches_bearer_token_when_configured() {
    let state = ServerState::default();
    let server_url = spawn_config_server(state.clone()).await;
    let client = IntegrationClient::new(&server_url)
        .expect("client")
        .with_api_token(SecretString::from("api-key".to_string()));

    client
        .get_config(&BusinessId::from("biz-1"))
        .await
        .expect("get");

    assert_eq!(
        state.authorization.lock().await.as_slice(),
        &[Some("Bearer api-key".to_string())]
    );
}

#[tokio::test]
async fn business_id_is_sent_as_a_single_path_segment() {
    let state = ServerState::default();
    let server_url = spawn_config_server(state.clone()).await;
    let client = IntegrationClient::new(&format!("{server_url}/")).expect("client");

    client
        .save_config(&BusinessId::from("acme/east"), &draft("a.myshopify.com", "t"))
        .await
        .expect("save");

    assert!(state.configs.lock().await.contains_key("acme/east"));
}

#[tokio::test]
async fn plain_not_found_without_envelope_is_a_rejection() {
    let server_url = spawn_raw_server(HttpStatus::NOT_FOUND, "").await;
    let client = IntegrationClient::new(&server_url).expect("client");

    let outcome = client
        .get_config(&BusinessId::from("biz-1"))
        .await
        .expect("absence is not a fault");
    assert_eq!(outcome, RemoteOutcome::Rejected { error: None });
}

#[tokio::test]
async fn non_json_error_status_is_a_fault() {
    let server_url = spawn_raw_server(HttpStatus::BAD_GATEWAY, "upstream exploded").await;
    let client = IntegrationClient::new(&server_url).expect("client");

    let err = client
        .delete_config(&BusinessId::from("biz-1"))
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    assert_eq!(err.operation(), Some("delete_config"));
}

#[tokio::test]
async fn undecodable_success_body_is_a_fault() {
    let server_url = spawn_raw_server(HttpStatus::OK, "<html>hello</html>").await;
    let client = IntegrationClient::new(&server_url).expect("client");

    let err = client
        .test_connection(&BusinessId::from("biz-1"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_fault() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = IntegrationClient::new(&format!("http://{addr}")).expect("client");

    let err = client
        .get_config(&BusinessId::from("biz-1"))
        .await
        .expect_err("must fail");
    assert!(err.is_connectivity(), "{err:?}");
}

#[tokio::test]
async fn existing_row_with_null_version_and_naive_timestamp_is_integrated() {
    let server_url = spawn_raw_server(
        HttpStatus::OK,
        r#"{"success":true,"data":{"id":1,"business_id":7,"store_url":"a.myshopify.com","api_version":null,"is_active":true,"updated_at":"2024-01-15T10:30:00.123456"}}"#,
    )
    .await;
    let client = IntegrationClient::new(&server_url).expect("client");

    let outcome = client
        .get_config(&BusinessId::from("7"))
        .await
        .expect("row decodes");
    let RemoteOutcome::Accepted {
        data: Some(summary),
        ..
    } = &outcome
    else {
        panic!("expected a summary, got {outcome:?}");
    };
    assert_eq!(summary.store_url, "a.myshopify.com");
    assert_eq!(summary.api_version, DEFAULT_API_VERSION);
    assert!(summary.updated_at.is_some());
}
