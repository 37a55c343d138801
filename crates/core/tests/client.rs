//! Client behaviour against an in-process mock of the teaser service.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use teaser_core::{
    GenerationRequest, LoginRequest, Method, ProfileMethod, Session, SignupRequest, TeaserClient,
    TeaserError, TransportError, ValidationError, VideoFile,
};

const YOUTUBE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Debug, Clone)]
struct CapturedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Captured {
    fields: Vec<CapturedField>,
    cookie: Option<String>,
}

impl Captured {
    fn field(&self, name: &str) -> Option<&CapturedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|f| f.text.as_deref())
    }
}

struct Mock {
    hits: AtomicUsize,
    captured: Mutex<Vec<Captured>>,
    status: StatusCode,
    body: Value,
    raw_body: Option<&'static str>,
    set_cookie: Option<&'static str>,
    delay: Duration,
}

impl Mock {
    fn replying(status: StatusCode, body: Value) -> Self {
        Self {
            hits: AtomicUsize::new(0),
            captured: Mutex::new(Vec::new()),
            status,
            body,
            raw_body: None,
            set_cookie: None,
            delay: Duration::ZERO,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last(&self) -> Captured {
        self.captured.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn reply(&self) -> Response {
        let mut response = match self.raw_body {
            Some(raw) => (self.status, raw).into_response(),
            None => (self.status, Json(self.body.clone())).into_response(),
        };
        if let Some(cookie) = self.set_cookie {
            response
                .headers_mut()
                .append(SET_COOKIE, HeaderValue::from_static(cookie));
        }
        response
    }
}

fn cookie_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn generate(
    State(mock): State<Arc<Mock>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);

    let mut captured = Captured {
        cookie: cookie_of(&headers),
        ..Captured::default()
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        captured.fields.push(CapturedField {
            name,
            file_name,
            content_type,
            text: String::from_utf8(bytes.to_vec()).ok(),
        });
    }
    mock.captured.lock().unwrap().push(captured);

    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }
    mock.reply()
}

async fn plain(State(mock): State<Arc<Mock>>, headers: HeaderMap) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    mock.captured.lock().unwrap().push(Captured {
        cookie: cookie_of(&headers),
        ..Captured::default()
    });
    mock.reply()
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn generate_service(mock: Mock) -> (Arc<Mock>, TeaserClient) {
    let mock = Arc::new(mock);
    let router = Router::new()
        .route("/generate-teaser", post(generate))
        .with_state(Arc::clone(&mock));
    let client = TeaserClient::with_base_url(&spawn(router).await).unwrap();
    (mock, client)
}

fn teaser_reply() -> Mock {
    Mock::replying(
        StatusCode::OK,
        json!({"s3_url": "https://x/teaser.mp4", "duration": 42, "timestamps": [{"start": 0, "end": 10}]}),
    )
}

fn clip() -> VideoFile {
    VideoFile::new("talk.mp4", "video/mp4", b"not really a video".to_vec())
}

#[tokio::test]
async fn youtube_submission_returns_normalized_result() {
    let (mock, client) = generate_service(teaser_reply()).await;

    let request = GenerationRequest::youtube(YOUTUBE_URL, Method::LearningA).with_lengths(20, 90);
    let result = client.submit(request, None).await.unwrap();

    assert_eq!(result.s3_url, "https://x/teaser.mp4");
    assert_eq!(result.duration, 42.0);
    assert_eq!(result.timestamps.len(), 1);
    assert_eq!(result.timestamps[0].length(), 10.0);

    let sent = mock.last();
    assert_eq!(sent.text("youtube_url"), Some(YOUTUBE_URL));
    assert_eq!(sent.text("method"), Some("learning_a"));
    assert_eq!(sent.text("max_length"), Some("90"));
    assert_eq!(sent.text("min_length"), Some("20"));
    assert!(sent.field("video_file").is_none());
    assert_eq!(sent.cookie, None);
}

#[tokio::test]
async fn upload_submission_sends_only_the_file_part() {
    let (mock, client) = generate_service(teaser_reply()).await;
    let session = Session::new("session=tok");

    client
        .submit(GenerationRequest::upload(clip(), Method::Gemini), Some(&session))
        .await
        .unwrap();

    let sent = mock.last();
    let file = sent.field("video_file").expect("file part");
    assert_eq!(file.file_name.as_deref(), Some("talk.mp4"));
    assert_eq!(file.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(file.text.as_deref(), Some("not really a video"));
    assert!(sent.field("youtube_url").is_none());
    assert_eq!(sent.text("method"), Some("gemini"));
    assert_eq!(sent.cookie.as_deref(), Some("session=tok"));
}

#[tokio::test]
async fn invalid_requests_never_reach_the_network() {
    let (mock, client) = generate_service(teaser_reply()).await;

    let mut missing_url = GenerationRequest::youtube(YOUTUBE_URL, Method::LearningB);
    missing_url.youtube_url = None;
    let mut missing_file = GenerationRequest::upload(clip(), Method::LearningB);
    missing_file.video_file = None;
    let mut both = GenerationRequest::upload(clip(), Method::LearningB);
    both.youtube_url = Some(YOUTUBE_URL.to_string());
    let inverted = GenerationRequest::youtube(YOUTUBE_URL, Method::LearningB).with_lengths(100, 60);

    let expected = [
        ValidationError::MissingYoutubeUrl,
        ValidationError::MissingVideoFile,
        ValidationError::ConflictingSources,
        ValidationError::MinExceedsMax {
            min_length: 100,
            max_length: 60,
        },
    ];
    for (request, expected) in [missing_url, missing_file, both, inverted].into_iter().zip(expected) {
        match client.submit(request, None).await {
            Err(TeaserError::Validation(err)) => assert_eq!(err, expected),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn oversized_upload_is_refused_locally() {
    let (mock, client) = generate_service(teaser_reply()).await;
    let client = client.with_max_upload_bytes(4);

    let err = client
        .submit(GenerationRequest::upload(clip(), Method::CinematicA), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TeaserError::Validation(ValidationError::FileTooLarge { limit: 4, .. })
    ));
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn rejection_carries_the_server_detail() {
    let (mock, client) = generate_service(Mock::replying(
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({"detail": "min_length exceeds max_length"}),
    ))
    .await;

    let err = client
        .submit(GenerationRequest::youtube(YOUTUBE_URL, Method::Gemini), None)
        .await
        .unwrap_err();

    match &err {
        TeaserError::RequestRejected { status, detail } => {
            assert_eq!(*status, 422);
            assert_eq!(detail, "min_length exceeds max_length");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(err.rejection_detail(), Some("min_length exceeds max_length"));
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn server_error_without_detail_uses_fallback_message() {
    let mut mock = Mock::replying(StatusCode::INTERNAL_SERVER_ERROR, Value::Null);
    mock.raw_body = Some("Internal Server Error");
    let (_, client) = generate_service(mock).await;

    let err = client
        .submit(GenerationRequest::youtube(YOUTUBE_URL, Method::Gemini), None)
        .await
        .unwrap_err();

    assert_eq!(
        err.rejection_detail(),
        Some("request failed with status 500")
    );
}

#[tokio::test]
async fn unresponsive_service_times_out_once() {
    let mut mock = teaser_reply();
    mock.delay = Duration::from_secs(10);
    let mock = Arc::new(mock);
    let router = Router::new()
        .route("/generate-teaser", post(generate))
        .with_state(Arc::clone(&mock));
    let base = spawn(router).await;
    let client = TeaserClient::new(base.parse().unwrap(), Duration::from_millis(300)).unwrap();

    let err = client
        .submit(GenerationRequest::youtube(YOUTUBE_URL, Method::LearningA), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, TeaserError::Transport(TransportError::Timeout(_))),
        "{err:?}"
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TeaserClient::with_base_url(&format!("http://{addr}")).unwrap();
    let err = client
        .submit(GenerationRequest::youtube(YOUTUBE_URL, Method::LearningA), None)
        .await
        .unwrap_err();

    assert!(err.is_transport(), "{err:?}");
}

#[tokio::test]
async fn malformed_success_body_is_a_transport_error() {
    let mut not_json = teaser_reply();
    not_json.raw_body = Some("<html>ok</html>");
    let (_, client) = generate_service(not_json).await;
    let err = client
        .submit(GenerationRequest::youtube(YOUTUBE_URL, Method::LearningA), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TeaserError::Transport(TransportError::Decode(_))));

    let reversed = Mock::replying(
        StatusCode::OK,
        json!({"s3_url": "https://x/t.mp4", "duration": 5, "timestamps": [[10, 5]]}),
    );
    let (_, client) = generate_service(reversed).await;
    let err = client
        .submit(GenerationRequest::youtube(YOUTUBE_URL, Method::LearningA), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TeaserError::Transport(TransportError::Decode(_))));
}

#[tokio::test]
async fn repeated_submissions_are_independent_calls() {
    let (mock, client) = generate_service(teaser_reply()).await;
    let request = GenerationRequest::youtube(YOUTUBE_URL, Method::CinematicA);

    let first = client.submit(request.clone(), None).await.unwrap();
    let second = client.submit(request, None).await.unwrap();

    assert_eq!(mock.hits(), 2);
    assert_eq!(first, second);
}

fn history_body() -> Value {
    json!([
        {"method": "learning_a", "created_at": "2025-01-10T08:00:00", "duration": 60},
        {"method": "gemini", "created_at": "2025-03-02T08:00:00", "duration": 45,
         "youtube_url": "https://youtu.be/x", "timestamps_used": [[0, 5], [30, 40]]},
        {"method": "tie-first", "created_at": "2025-02-01T12:00:00", "duration": 30},
        {"method": "tie-second", "created_at": "2025-02-01T12:00:00Z", "duration": 30}
    ])
}

async fn account_service(
    profile_method: ProfileMethod,
    login: Mock,
    profile: Mock,
) -> (Arc<Mock>, Arc<Mock>, TeaserClient) {
    let login = Arc::new(login);
    let profile = Arc::new(profile);
    let profile_route = match profile_method {
        ProfileMethod::Get => get(plain),
        ProfileMethod::Post => post(plain),
    };
    let router = Router::new()
        .route("/login", post(plain).with_state(Arc::clone(&login)))
        .route("/profile", profile_route.with_state(Arc::clone(&profile)));
    let client = TeaserClient::with_base_url(&spawn(router).await)
        .unwrap()
        .with_profile_method(profile_method);
    (login, profile, client)
}

fn login_reply() -> Mock {
    let mut mock = Mock::replying(StatusCode::OK, json!({"message": "Login successful"}));
    mock.set_cookie = Some("session=tok-123; HttpOnly; Path=/; SameSite=Lax");
    mock
}

#[tokio::test]
async fn login_session_is_sent_back_for_history() {
    let (_, profile, client) = account_service(
        ProfileMethod::Get,
        login_reply(),
        Mock::replying(StatusCode::OK, history_body()),
    )
    .await;

    let outcome = client
        .login(&LoginRequest::new("ana@example.com", "hunter2"))
        .await
        .unwrap();
    assert_eq!(outcome.message.as_deref(), Some("Login successful"));

    let history = client.fetch_history(&outcome.session).await.unwrap();
    let order: Vec<_> = history.iter().map(|e| e.method.as_str()).collect();
    assert_eq!(order, ["gemini", "tie-first", "tie-second", "learning_a"]);
    assert_eq!(history[0].timestamps_used[1].length(), 10.0);
    assert_eq!(profile.last().cookie.as_deref(), Some("session=tok-123"));
}

#[tokio::test]
async fn history_can_be_fetched_with_post() {
    let (_, profile, client) = account_service(
        ProfileMethod::Post,
        login_reply(),
        Mock::replying(StatusCode::OK, json!([])),
    )
    .await;

    let history = client
        .fetch_history(&Session::new("session=abc"))
        .await
        .unwrap();
    assert!(history.is_empty());
    assert_eq!(profile.hits(), 1);
}

#[tokio::test]
async fn history_failure_is_a_rejection() {
    let (_, _, client) = account_service(
        ProfileMethod::Get,
        login_reply(),
        Mock::replying(StatusCode::UNAUTHORIZED, json!({"detail": "Not authenticated"})),
    )
    .await;

    let err = client
        .fetch_history(&Session::new("session=stale"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection_detail(), Some("Not authenticated"));
}

#[tokio::test]
async fn login_failures_are_typed() {
    let (_, _, client) = account_service(
        ProfileMethod::Get,
        Mock::replying(StatusCode::UNAUTHORIZED, json!({"detail": "Invalid credentials"})),
        Mock::replying(StatusCode::OK, json!([])),
    )
    .await;
    let err = client
        .login(&LoginRequest::new("ana@example.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection_detail(), Some("Invalid credentials"));

    let (login, _, client) = account_service(
        ProfileMethod::Get,
        Mock::replying(StatusCode::OK, json!({"message": "ok"})),
        Mock::replying(StatusCode::OK, json!([])),
    )
    .await;
    let err = client
        .login(&LoginRequest::new("ana@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TeaserError::Transport(TransportError::MissingSessionCookie)
    ));

    let err = client
        .login(&LoginRequest::new("not-an-email", "pw"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(login.hits(), 1);
}

#[tokio::test]
async fn signup_and_health() {
    let signup = Arc::new(Mock::replying(
        StatusCode::BAD_REQUEST,
        json!({"detail": "Email already registered"}),
    ));
    let health = Arc::new(Mock::replying(StatusCode::OK, json!({"status": "healthy"})));
    let router = Router::new()
        .route("/signup", post(plain).with_state(Arc::clone(&signup)))
        .route("/health", get(plain).with_state(Arc::clone(&health)));
    let client = TeaserClient::with_base_url(&spawn(router).await).unwrap();

    let err = client
        .signup(&SignupRequest::new("ana", "ana@example.com", "hunter2"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection_detail(), Some("Email already registered"));

    assert_eq!(client.health().await.unwrap(), "healthy");
    assert_eq!(signup.hits() + health.hits(), 2);
}
