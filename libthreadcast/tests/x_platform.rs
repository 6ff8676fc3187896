//! X client against a local HTTP double

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use libthreadcast::config::XConfig;
use libthreadcast::credentials::XCredentials;
use libthreadcast::platforms::x::XPlatform;
use libthreadcast::platforms::Platform;
use libthreadcast::{MediaAttachment, PlatformError, PostId, Thread, ThreadPoster, ThreadStep};
use serde_json::{json, Value};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client(server: &MockServer) -> XPlatform {
    let config = XConfig {
        api_base: server.uri(),
        upload_base: server.uri(),
        request_timeout_secs: 5,
    };
    XPlatform::new(&config, XCredentials::new("ck", "cs", "at", "as")).unwrap()
}

/// Answers each tweet creation with the next id, starting at 100
fn sequential_ids() -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    let counter = Arc::new(AtomicUsize::new(100));
    move |_: &Request| {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": id.to_string(), "text": "" } }))
    }
}

async fn tweet_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/2/tweets")
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

#[tokio::test]
async fn test_upload_media_returns_media_id_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media_id": 710511363345354753u64,
            "media_id_string": "710511363345354753",
            "size": 11065
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = client(&server)
        .upload_media(&[1, 2, 3], "image/png")
        .await
        .unwrap();
    assert_eq!(handle.as_str(), "710511363345354753");

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
}

#[tokio::test]
async fn test_upload_failure_maps_to_media_upload_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "code": 324, "message": "Invalid media" }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_media(&[0], "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::MediaUploadFailed(ref m) if m.contains("Invalid media")));
}

#[tokio::test]
async fn test_submit_sends_media_and_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(sequential_ids())
        .mount(&server)
        .await;

    let x = client(&server);
    let parent = PostId::new("42");
    let handles = vec![libthreadcast::MediaHandle::new("m1")];

    let id = x.submit("hello", &handles, Some(&parent)).await.unwrap();
    assert_eq!(id.as_str(), "100");

    let bodies = tweet_bodies(&server).await;
    assert_eq!(
        bodies[0],
        json!({
            "text": "hello",
            "media": { "media_ids": ["m1"] },
            "reply": { "in_reply_to_tweet_id": "42" }
        })
    );
}

#[tokio::test]
async fn test_submit_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "title": "Forbidden",
            "detail": "You are not allowed to create a Tweet with duplicate content.",
            "status": 403
        })))
        .mount(&server)
        .await;

    let err = client(&server).submit("dup", &[], None).await.unwrap_err();
    assert!(matches!(err, PlatformError::SubmissionRejected(ref m) if m.contains("duplicate content")));

    let down = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;

    let err = client(&down).submit("hi", &[], None).await.unwrap_err();
    assert!(matches!(err, PlatformError::SubmissionFailed(_)));
}

#[tokio::test]
async fn test_thread_over_x_forms_reply_chain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "555" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(sequential_ids())
        .expect(3)
        .mount(&server)
        .await;

    let poster = ThreadPoster::new(Arc::new(client(&server)));
    let media = MediaAttachment::from_bytes(vec![9, 9, 9], "image/jpeg", 0);
    let thread = Thread::new(
        vec!["First".into(), "Second".into(), "Third".into()],
        vec![media],
    )
    .unwrap();

    let ids = poster.post_thread(thread).await.unwrap();
    assert_eq!(
        ids,
        vec![PostId::new("100"), PostId::new("101"), PostId::new("102")]
    );

    let bodies = tweet_bodies(&server).await;
    assert_eq!(bodies[0]["media"]["media_ids"], json!(["555"]));
    assert!(bodies[0].get("reply").is_none());
    assert_eq!(bodies[1]["reply"]["in_reply_to_tweet_id"], "100");
    assert!(bodies[1].get("media").is_none());
    assert_eq!(bodies[2]["reply"]["in_reply_to_tweet_id"], "101");
}

#[tokio::test]
async fn test_thread_over_x_stops_after_rejection() {
    let server = MockServer::start().await;
    let counter = Arc::new(AtomicUsize::new(0));
    let responder = {
        let counter = Arc::clone(&counter);
        move |_: &Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "1" } }))
            } else {
                ResponseTemplate::new(400).set_body_json(json!({ "detail": "Invalid reply" }))
            }
        }
    };
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(responder)
        .mount(&server)
        .await;

    let poster = ThreadPoster::new(Arc::new(client(&server)));
    let thread = Thread::new(vec!["a".into(), "b".into(), "c".into()], vec![]).unwrap();

    let err = poster.post_thread(thread).await.unwrap_err();
    assert_eq!(err.step, ThreadStep::Submit);
    assert_eq!(err.index, 1);
    assert_eq!(err.posted, vec![PostId::new("1")]);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
