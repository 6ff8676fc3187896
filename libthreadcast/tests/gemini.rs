//! Gemini client against a local HTTP double

use libthreadcast::config::GenerationConfig;
use libthreadcast::generation::gemini::GeminiClient;
use libthreadcast::generation::{ImageGenerator, TextGenerator};
use libthreadcast::PlatformError;
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GeminiClient {
    let config = GenerationConfig {
        gemini_base: server.uri(),
        ..GenerationConfig::default()
    };
    GeminiClient::new(&config, SecretString::from("test-key".to_string())).unwrap()
}

#[tokio::test]
async fn test_generate_text_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Tweet 1: Hello" },
                { "text": "\nTweet 2: World" }
            ] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server).generate_text("prompt").await.unwrap();
    assert_eq!(text, "Tweet 1: Hello\nTweet 2: World");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
    assert!(body.get("generationConfig").is_none());
}

#[tokio::test]
async fn test_generate_images_skips_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/v1beta/models/gemini-2.0-flash-exp-image-generation:generateContent",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your cat" },
                { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
            ] } }]
        })))
        .mount(&server)
        .await;

    let images = client(&server).generate_images("a cat").await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data, vec![1, 2, 3]);
    assert_eq!(images[0].data_uri(), "data:image/png;base64,AQID");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(
        body["generationConfig"]["responseModalities"],
        json!(["Text", "Image"])
    );
}

#[tokio::test]
async fn test_upstream_error_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server).generate_text("prompt").await.unwrap_err();
    assert!(matches!(err, PlatformError::Generation(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_empty_candidates_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server).generate_text("prompt").await.unwrap_err();
    assert!(matches!(err, PlatformError::Generation(_)));

    let images = client(&server).generate_images("prompt").await.unwrap();
    assert!(images.is_empty());
}
