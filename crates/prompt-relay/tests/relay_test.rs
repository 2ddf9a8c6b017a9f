use actix_web::{http::header::ContentType, http::StatusCode, test, web, App};
use prompt_relay::{
    error::{PROMPT_REQUIRED, UPSTREAM_FAILED},
    server::{routes, AppState},
    RelayConfig, RelayMode,
};
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-secret-key-123";
const MODEL: &str = "gemini-test";

fn state(base_url: &str, mode: RelayMode) -> web::Data<AppState> {
    let config = RelayConfig::new(API_KEY)
        .with_base_url(base_url)
        .with_model(MODEL)
        .with_mode(mode);
    web::Data::new(AppState::new(&config).unwrap())
}

fn generate_path() -> String {
    format!("/v1beta/models/{}:generateContent", MODEL)
}

fn stream_path() -> String {
    format!("/v1beta/models/{}:streamGenerateContent", MODEL)
}

fn sse_body(texts: &[&str]) -> String {
    texts
        .iter()
        .map(|t| {
            format!(
                "data: {}\r\n\r\n",
                json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": t }] } }] })
            )
        })
        .collect()
}

fn upstream_body(prompt: &str) -> serde_json::Value {
    json!({ "contents": [{ "parts": [{ "text": prompt }] }] })
}

#[actix_web::test]
async fn test_health() {
    let upstream = MockServer::start().await;
    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Buffered))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn test_missing_prompt_is_rejected_without_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Streaming))
            .configure(routes),
    )
    .await;

    for payload in [
        json!({}),
        json!({ "prompt": "" }),
        json!({ "prompt": null }),
        json!({ "prompt": 42 }),
        json!({ "message": "hello" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
        let body = test::read_body(resp).await;
        assert_eq!(body, PROMPT_REQUIRED);
    }

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .insert_header(ContentType::json())
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    upstream.verify().await;
}

#[actix_web::test]
async fn test_buffered_relays_document_verbatim() {
    let upstream = MockServer::start().await;
    let document = r#"{"text":"hello"}"#;

    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(header("x-goog-api-key", API_KEY))
        .and(body_json(upstream_body("Say hello")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(document, "application/json"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Buffered))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "Say hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body = test::read_body(resp).await;
    assert_eq!(body, document);

    upstream.verify().await;
}

#[actix_web::test]
async fn test_buffered_upstream_error_is_generic() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(
            ResponseTemplate::new(503).set_body_string("model overloaded, quota project xyz"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Buffered))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert_eq!(text, UPSTREAM_FAILED);
    assert!(!text.contains("503"));
    assert!(!text.contains("overloaded"));
    assert!(!text.contains(API_KEY));

    upstream.verify().await;
}

#[actix_web::test]
async fn test_unreachable_upstream_is_generic_error() {
    // Nothing listens on port 1.
    let app = test::init_service(
        App::new()
            .app_data(state("http://127.0.0.1:1", RelayMode::Buffered))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = test::read_body(resp).await;
    assert_eq!(body, UPSTREAM_FAILED);
}

#[actix_web::test]
async fn test_streaming_relays_fragments_in_order() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(stream_path()))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", API_KEY))
        .and(body_json(upstream_body("Greet me")))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["Hel", "lo"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Streaming))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "Greet me" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );

    let body = test::read_body(resp).await;
    assert_eq!(body, "Hello");

    upstream.verify().await;
}

#[actix_web::test]
async fn test_streaming_upstream_error_before_output() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(stream_path()))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Streaming))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = test::read_body(resp).await;
    assert_eq!(body, UPSTREAM_FAILED);

    upstream.verify().await;
}

#[actix_web::test]
async fn test_streaming_undecodable_first_event_is_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(stream_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: {oops\n\n", "text/event-stream"),
        )
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Streaming))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_passthrough_relays_raw_sse() {
    let upstream = MockServer::start().await;
    let raw = sse_body(&["Hel", "lo"]);
    Mock::given(method("POST"))
        .and(path(stream_path()))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(raw.clone(), "text/event-stream"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Passthrough))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    assert_eq!(body, raw.as_bytes());
    assert!(!std::str::from_utf8(&body).unwrap().contains(API_KEY));

    upstream.verify().await;
}

#[actix_web::test]
async fn test_whitespace_prompt_is_forwarded() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(body_json(upstream_body("  ")))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&upstream.uri(), RelayMode::Buffered))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({ "prompt": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    upstream.verify().await;
}
