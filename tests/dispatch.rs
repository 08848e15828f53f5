//! End-to-end tests: platform event in, platform response out, through the
//! dispatcher and both concrete adapters.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use straylight::adapters::http_api::HttpApiAdapter;
use straylight::adapters::rest_api::{RestApiAdapter, RestApiConfig};
use straylight::dispatcher::{DispatchError, Dispatcher, RequestHandler};
use straylight::types::{HttpRequest, HttpResponse, OneOrMany, ResponseBody};

/// Install a subscriber when `RUST_LOG` asks for one; repeated calls are
/// harmless.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Handler that echoes the canonical request back as JSON text.
struct EchoHandler;

#[async_trait]
impl RequestHandler for EchoHandler {
    async fn handle(&self, request: HttpRequest) -> anyhow::Result<HttpResponse> {
        let body = json!({
            "method": request.method,
            "path": request.path,
            "remoteAddress": request.remote_address,
            "bodyBytes": request.body.as_ref().map(Vec::len),
        })
        .to_string();

        let mut response = HttpResponse::with_status(200);
        response.headers.insert(
            "content-type".to_string(),
            OneOrMany::Single("application/json".to_string()),
        );
        response.body = Some(ResponseBody::Text(body));
        Ok(response)
    }
}

/// Handler that always fails.
struct FailingHandler;

#[async_trait]
impl RequestHandler for FailingHandler {
    async fn handle(&self, _request: HttpRequest) -> anyhow::Result<HttpResponse> {
        anyhow::bail!("downstream handler exploded")
    }
}

fn dispatcher(handler: Arc<dyn RequestHandler>) -> Dispatcher {
    Dispatcher::new(handler)
        .register(Arc::new(RestApiAdapter::new(RestApiConfig {
            strip_base_path: "/api".to_string(),
        })))
        .register(Arc::new(HttpApiAdapter::new()))
}

fn v1_event() -> Value {
    json!({
        "httpMethod": "POST",
        "path": "/api/users",
        "headers": {
            "Content-Type": "application/json",
            "X-Forwarded-For": "203.0.113.7"
        },
        "queryStringParameters": { "id": "1" },
        "body": "{\"name\":\"case\"}",
        "isBase64Encoded": false,
        "requestContext": { "stage": "prod" }
    })
}

fn v2_event() -> Value {
    json!({
        "version": "2.0",
        "routeKey": "GET /users",
        "rawPath": "/users",
        "rawQueryString": "id=1",
        "headers": { "accept": "application/json" },
        "requestContext": { "http": { "method": "GET" } }
    })
}

fn echoed_body(platform: &Value) -> Value {
    let body = platform["body"].as_str().expect("body should be a string");
    serde_json::from_str(body).expect("echo body should be JSON")
}

#[tokio::test]
async fn v1_event_round_trips_through_the_handler() {
    init_logging();
    let dispatcher = dispatcher(Arc::new(EchoHandler));

    let platform = dispatcher
        .dispatch(&v1_event())
        .await
        .expect("dispatch should succeed");

    assert_eq!(platform["statusCode"], 200);
    assert_eq!(platform["headers"]["content-type"], "application/json");
    assert_eq!(platform["isBase64Encoded"], false);

    let echoed = echoed_body(&platform);
    assert_eq!(echoed["method"], "POST");
    // Base path stripped, query reconstructed.
    assert_eq!(echoed["path"], "/users?id=1");
    assert_eq!(echoed["remoteAddress"], "203.0.113.7");
    assert_eq!(echoed["bodyBytes"], 15);
}

#[tokio::test]
async fn v2_event_round_trips_through_the_handler() {
    init_logging();
    let dispatcher = dispatcher(Arc::new(EchoHandler));

    let platform = dispatcher
        .dispatch(&v2_event())
        .await
        .expect("dispatch should succeed");

    assert_eq!(platform["statusCode"], 200);
    let echoed = echoed_body(&platform);
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/users?id=1");
    assert_eq!(echoed["remoteAddress"], Value::Null);
}

#[tokio::test]
async fn recognition_is_mutually_exclusive() {
    init_logging();
    let rest = RestApiAdapter::default();
    let http = HttpApiAdapter::new();

    use straylight::adapters::Adapter;
    assert!(rest.can_handle(&v1_event()));
    assert!(!rest.can_handle(&v2_event()));
    assert!(http.can_handle(&v2_event()));
    assert!(!http.can_handle(&v1_event()));
}

#[tokio::test]
async fn unrecognized_event_is_a_routing_miss() {
    init_logging();
    let dispatcher = dispatcher(Arc::new(EchoHandler));

    let result = dispatcher.dispatch(&json!({ "kind": "timer" })).await;
    assert!(matches!(result, Err(DispatchError::NoAdapter)));
}

#[tokio::test]
async fn handler_failure_yields_empty_500_by_default() {
    init_logging();
    let dispatcher = dispatcher(Arc::new(FailingHandler));

    let platform = dispatcher
        .dispatch(&v1_event())
        .await
        .expect("error path must still complete the exchange");

    assert_eq!(platform["statusCode"], 500);
    assert_eq!(platform["body"], "");
}

#[tokio::test]
async fn handler_failure_exposes_detail_when_opted_in() {
    init_logging();
    let dispatcher = dispatcher(Arc::new(FailingHandler)).respond_with_errors(true);

    let platform = dispatcher
        .dispatch(&v2_event())
        .await
        .expect("error path must still complete the exchange");

    assert_eq!(platform["statusCode"], 500);
    assert!(
        platform["body"]
            .as_str()
            .expect("body should be a string")
            .contains("downstream handler exploded"),
        "verbose mode must carry the failure detail"
    );
}

#[tokio::test]
async fn dispatcher_is_shareable_across_concurrent_requests() {
    init_logging();
    let dispatcher = Arc::new(dispatcher(Arc::new(EchoHandler)));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            dispatcher.dispatch(&v1_event()).await
        }));
    }
    for task in tasks {
        let platform = task
            .await
            .expect("task should not panic")
            .expect("dispatch should succeed");
        assert_eq!(platform["statusCode"], 200);
    }
}
