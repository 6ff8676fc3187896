//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use libthreadcast::generation::mock::StaticGenerator;
use libthreadcast::generation::GeneratedImage;
use libthreadcast::platforms::mock::{MockPlatform, SubmitFailure};
use libthreadcast::service::generation::GenerationService;
use libthreadcast::service::ThreadcastService;
use libthreadcast::Config;
use serde_json::{json, Value};
use threadcast_server::{build_router, AppState};
use tower::ServiceExt;

fn app(platform: &MockPlatform, generator: Option<StaticGenerator>) -> Router {
    let generation = match generator {
        Some(g) => GenerationService::new(Arc::new(g.clone()), Arc::new(g), None),
        None => GenerationService::default(),
    };
    let service = ThreadcastService::with_components(
        Config::default(),
        Arc::new(platform.clone()),
        generation,
    )
    .unwrap();
    build_router(AppState::new(service))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    call(app, request).await
}

async fn send_raw(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(app, request).await
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(app(&platform, None), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "platform": "mock" }));
}

#[tokio::test]
async fn test_post_thread_success() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({
            "posts": ["First", "Second", "Third"],
            "media": [{
                "sourceType": "file",
                "mimeType": "image/png",
                "targetPostIndex": 0,
                "data": "iVBORw0KGgo="
            }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["postIds"],
        json!(["mock-tweet-id-1", "mock-tweet-id-2", "mock-tweet-id-3"])
    );

    let calls = platform.submit_calls();
    assert_eq!(calls[0].media.len(), 1);
    assert_eq!(calls[2].reply_to.as_ref().unwrap().as_str(), "mock-tweet-id-2");
}

#[tokio::test]
async fn test_post_tweet_alias_accepts_tweets_field() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-tweet",
        Some(json!({ "tweets": ["Only post"], "media": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["postIds"], json!(["mock-tweet-id-1"]));
}

#[tokio::test]
async fn test_post_thread_requires_posts() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({ "media": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tweets are required");
    assert_eq!(body["kind"], "InvalidInput");
    assert!(body.get("step").is_none());
    assert_eq!(platform.submit_call_count(), 0);
}

#[tokio::test]
async fn test_blob_media_is_bad_request() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({
            "posts": ["a", "b"],
            "media": [{
                "sourceType": "url",
                "mimeType": "image/png",
                "targetPostIndex": 1,
                "url": "blob:http://localhost:3000/0b7e"
            }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidMediaSource");
    assert_eq!(body["step"], "upload");
    assert_eq!(body["index"], 1);
    assert_eq!(body["postIds"], json!([]));
    assert_eq!(platform.submit_call_count(), 0);
}

#[tokio::test]
async fn test_partial_failure_reports_posted_ids() {
    let platform = MockPlatform::submit_failure_at("mock", 1, SubmitFailure::Transport);
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({ "posts": ["one", "two", "three"] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "SubmissionFailed");
    assert_eq!(body["step"], "submit");
    assert_eq!(body["index"], 1);
    assert_eq!(body["postIds"], json!(["mock-tweet-id-1"]));
}

#[tokio::test]
async fn test_upstream_rejection_is_unprocessable() {
    let platform = MockPlatform::success("mock");
    let long = "x".repeat(281);
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({ "posts": [long] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "SubmissionRejected");
}

#[tokio::test]
async fn test_generate_single_tweet() {
    let platform = MockPlatform::success("mock");
    let generator = StaticGenerator::new("  Cats are liquid.  ", vec![]);
    let (status, body) = send(
        app(&platform, Some(generator)),
        "POST",
        "/api/generate",
        Some(json!({ "prompt": "Tell me about cats" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "tweets": ["Cats are liquid."] }));
}

#[tokio::test]
async fn test_generate_thread_from_long_prompt() {
    let platform = MockPlatform::success("mock");
    let generator = StaticGenerator::new(
        "Tweet 1: Cats sleep.\nTweet 2: Cats eat.\nTweet 3: Cats judge.",
        vec![],
    );
    let prompt = "Explain, in a lighthearted way, what an ordinary house cat does across a whole day at home";
    assert!(prompt.len() > 50);

    let (status, body) = send(
        app(&platform, Some(generator)),
        "POST",
        "/api/generate",
        Some(json!({ "prompt": prompt })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["tweets"],
        json!(["Cats sleep.", "Cats eat.", "Cats judge."])
    );
}

#[tokio::test]
async fn test_generate_requires_prompt() {
    let platform = MockPlatform::success("mock");
    let generator = StaticGenerator::new("unused", vec![]);
    let (status, body) = send(
        app(&platform, Some(generator)),
        "POST",
        "/api/generate",
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Prompt is required" }));
}

#[tokio::test]
async fn test_generate_failure_is_generic_500() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, Some(StaticGenerator::failing())),
        "POST",
        "/api/generate",
        Some(json!({ "prompt": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to generate tweets" }));
}

#[tokio::test]
async fn test_generation_not_configured() {
    let platform = MockPlatform::success("mock");
    let (status, _) = send(
        app(&platform, None),
        "POST",
        "/api/generate-image",
        Some(json!({ "prompt": "a cat" })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_generate_image_returns_data_uris() {
    let platform = MockPlatform::success("mock");
    let generator = StaticGenerator::new(
        "",
        vec![GeneratedImage::new("image/png", vec![1, 2, 3])],
    );
    let (status, body) = send(
        app(&platform, Some(generator)),
        "POST",
        "/api/generate-image",
        Some(json!({ "prompt": "a cat in a hat" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "imageUrls": ["data:image/png;base64,AQID"] }));
}

#[tokio::test]
async fn test_validate_reports_counts() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/validate",
        Some(json!({ "posts": ["hello", ""] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["characterLimit"], 280);
    assert_eq!(body["posts"][0]["remaining"], 275);
    assert_eq!(body["posts"][1]["errors"][0], "Post is empty");
    assert_eq!(platform.submit_call_count(), 0);
}

#[tokio::test]
async fn test_unknown_source_type_is_invalid_input() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({
            "posts": ["a"],
            "media": [{
                "sourceType": "ftp",
                "mimeType": "image/png",
                "targetPostIndex": 0,
                "url": "ftp://example.com/a.png"
            }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidInput");
    assert!(body["error"].as_str().unwrap().contains("sourceType"));
    assert!(body.get("step").is_none());
    assert_eq!(body["postIds"], json!([]));
    assert_eq!(platform.upload_call_count(), 0);
}

#[tokio::test]
async fn test_negative_target_index_is_invalid_input() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send(
        app(&platform, None),
        "POST",
        "/api/post-thread",
        Some(json!({
            "posts": ["a"],
            "media": [{
                "sourceType": "file",
                "mimeType": "image/png",
                "targetPostIndex": -1,
                "data": "AQID"
            }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidInput");
    assert_eq!(platform.submit_call_count(), 0);
}

#[tokio::test]
async fn test_non_json_post_body_is_invalid_input() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send_raw(app(&platform, None), "/api/post-thread", "not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidInput");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_generate_body_is_json_error() {
    let platform = MockPlatform::success("mock");
    let generator = StaticGenerator::new("unused", vec![]);
    let (status, body) = send_raw(app(&platform, Some(generator.clone())), "/api/generate", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn test_malformed_validate_body_is_json_error() {
    let platform = MockPlatform::success("mock");
    let (status, body) = send_raw(app(&platform, None), "/api/validate", "{\"posts\": 3}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
