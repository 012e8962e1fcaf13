//! HTTP API tests
//!
//! The full router is driven with `tower::ServiceExt::oneshot`; the store is
//! in memory and every outbound integration is a stub.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use waylo_notification_service::config::Settings;
use waylo_notification_service::credentials::{BearerToken, CredentialError, TokenSource};
use waylo_notification_service::email::{EmailContent, EmailError, EmailSender};
use waylo_notification_service::error::AppError;
use waylo_notification_service::metrics::HTTP_REQUESTS_TOTAL;
use waylo_notification_service::notification::{
    AlertCandidate, DeliveryError, FanoutDispatcher, NotificationCategory, NotificationMessage,
    PreferenceFlags, PushProvider,
};
use waylo_notification_service::server::{create_app, AppState};
use waylo_notification_service::sources::WeatherSource;
use waylo_notification_service::store::{MemoryProfile, MemoryRecipientStore, Trip};

// ============================================================================
// Stubs
// ============================================================================

#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
    titles: Mutex<Vec<String>>,
}

#[async_trait]
impl PushProvider for CountingProvider {
    async fn deliver(
        &self,
        _token: &BearerToken,
        _device_token: &str,
        message: &NotificationMessage,
        _channel_id: &str,
    ) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.titles.lock().unwrap().push(message.title.clone());
        Ok(())
    }
}

struct StaticTokens(Result<(), CredentialError>);

#[async_trait]
impl TokenSource for StaticTokens {
    async fn token(&self) -> Result<BearerToken, CredentialError> {
        self.0
            .clone()
            .map(|_| BearerToken::new("test-token", Utc::now() + chrono::Duration::hours(1)))
    }
}

#[derive(Default)]
struct CapturingEmail {
    sent: Mutex<Vec<(String, EmailContent)>>,
}

#[async_trait]
impl EmailSender for CapturingEmail {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push((to.to_string(), content.clone()));
        Ok(())
    }
}

struct StormWeather {
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherSource for StormWeather {
    async fn alerts(&self, _lat: f64, _lng: f64) -> Vec<AlertCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![AlertCandidate::new("Typhoon Warning", "Typhoon approaching the coast")]
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.weather.request_spacing_ms = 0;
    settings
}

fn seeded_store() -> Arc<MemoryRecipientStore> {
    let store = MemoryRecipientStore::new();

    store.insert_profile("alice", MemoryProfile::with_device("device-alice"));
    store.set_preferences("alice", PreferenceFlags::all_enabled());

    store.insert_profile("bob", MemoryProfile::with_device("device-bob"));
    store.set_preferences(
        "bob",
        PreferenceFlags::all_enabled().with(NotificationCategory::WeatherWarnings, false),
    );

    // no settings row
    store.insert_profile("carol", MemoryProfile::with_device("device-carol"));

    Arc::new(store)
}

fn dispatcher(provider: Arc<CountingProvider>, tokens_ok: bool) -> Arc<FanoutDispatcher> {
    let tokens = if tokens_ok {
        StaticTokens(Ok(()))
    } else {
        StaticTokens(Err(CredentialError::ExchangeRejected { status: 401 }))
    };
    Arc::new(FanoutDispatcher::new(Arc::new(tokens), provider))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ============================================================================
// Health & metrics
// ============================================================================

#[tokio::test]
async fn test_health_reports_unconfigured_push() {
    let app = create_app(AppState::with_store(settings(), seeded_store()));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["push"], false);
    assert_eq!(body["components"]["store"], "memory");
}

#[tokio::test]
async fn test_stats_include_dispatcher_counters() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider, true)),
    );

    let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["push"]["batches"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    let app = create_app(AppState::with_store(settings(), seeded_store()));

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("waylo_"));
}

#[tokio::test]
async fn test_rejected_requests_are_counted() {
    let mut settings = settings();
    settings.api.key = Some("service-key".to_string());
    let counter = |status: &str| {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["/api/v1/push/send", status])
            .get()
    };
    let unauthorized_before = counter("401");
    let invalid_before = counter("400");

    let state = AppState::with_store(settings, seeded_store());
    let payload = json!({"type": "trip_reminders", "title": "t", "body": "b"});

    let (status, _) = call(create_app(state.clone()), post_json("/api/v1/push/send", payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = post_json("/api/v1/push/send", payload);
    request.headers_mut().insert("x-api-key", "service-key".parse().unwrap());
    let (status, _) = call(create_app(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(counter("401") > unauthorized_before);
    assert!(counter("400") > invalid_before);
}

// ============================================================================
// Push
// ============================================================================

#[tokio::test]
async fn test_push_requires_recipients() {
    let app = create_app(AppState::with_store(settings(), seeded_store()));

    let (status, body) = call(
        app,
        post_json("/api/v1/push/send", json!({"type": "trip_reminders", "title": "t", "body": "b"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_push_without_signing_key_is_configuration_error() {
    let app = create_app(AppState::with_store(settings(), seeded_store()));

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/push/send",
            json!({"user_id": "alice", "type": "trip_reminders", "title": "t", "body": "b"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_push_fans_out_with_per_recipient_outcomes() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider.clone(), true)),
    );

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/push/send",
            json!({
                "user_ids": ["alice", "bob", "carol", "alice"],
                "type": "weather_warnings",
                "title": "Storm ahead",
                "body": "Pack an umbrella",
                "data": {"trip_id": "t-1"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["sent"], 1);
    assert_eq!(body["suppressed"], 2);
    assert_eq!(body["total"], 3);
    assert_eq!(body["results"][0]["user_id"], "alice");
    assert_eq!(body["results"][0]["outcome"]["status"], "sent");
    assert_eq!(body["results"][1]["outcome"]["reason"], "category_disabled");
    assert_eq!(body["results"][2]["outcome"]["reason"], "no_preferences");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_push_credential_failure_is_bad_gateway() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider.clone(), false)),
    );

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/push/send",
            json!({"user_id": "alice", "type": "trip_reminders", "title": "t", "body": "b"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"]["code"],
        AppError::Credential(CredentialError::ExchangeRejected { status: 401 }).code()
    );
    assert_eq!(body["error"]["code"], "CREDENTIAL_UNAVAILABLE");
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"][0]["outcome"]["reason"]["kind"], "credential_unavailable");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_api_key_enforced_when_configured() {
    let mut settings = settings();
    settings.api.key = Some("service-key".to_string());
    let provider = Arc::new(CountingProvider::default());
    let state = AppState::with_store(settings, seeded_store()).with_push(dispatcher(provider, true));
    let payload = json!({"user_id": "alice", "type": "trip_reminders", "title": "t", "body": "b"});

    let (status, body) = call(create_app(state.clone()), post_json("/api/v1/push/send", payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let mut request = post_json("/api/v1/push/send", payload);
    request
        .headers_mut()
        .insert("authorization", "Bearer service-key".parse().unwrap());
    let (status, _) = call(create_app(state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = call(create_app(state), request).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Weather sweep
// ============================================================================

fn trip(id: &str, owner: &str) -> Trip {
    Trip {
        id: id.to_string(),
        title: "Okinawa Escape".to_string(),
        destination: "Naha".to_string(),
        destination_lat: 26.2,
        destination_lng: 127.7,
        owner_id: owner.to_string(),
        status: "active".to_string(),
        start_date: Some(Utc::now().date_naive()),
    }
}

#[tokio::test]
async fn test_weather_sweep_skips_opted_out_owners() {
    let store = seeded_store();
    store.insert_trip(trip("trip-alice", "alice"));
    store.insert_trip(trip("trip-bob", "bob"));

    let weather = Arc::new(StormWeather { calls: AtomicUsize::new(0) });
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), store)
            .with_push(dispatcher(provider.clone(), true))
            .with_weather(weather.clone()),
    );

    let (status, body) = call(app, post_json("/api/v1/weather/check", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_trips"], 2);
    assert_eq!(body["checked"], 1);
    assert_eq!(body["alerts_sent"], 1);
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.titles.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_weather_sweep_requires_weather_key() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider, true)),
    );

    let (status, body) = call(app, post_json("/api/v1/weather/check", json!({}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_weather_sweep_stops_without_credentials() {
    let store = seeded_store();
    store.insert_trip(trip("trip-a", "alice"));
    store.insert_trip(trip("trip-b", "alice"));

    let weather = Arc::new(StormWeather { calls: AtomicUsize::new(0) });
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), store)
            .with_push(dispatcher(provider.clone(), false))
            .with_weather(weather.clone()),
    );

    let (status, body) = call(app, post_json("/api/v1/weather/check", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "CREDENTIAL_UNAVAILABLE");
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Daily tip
// ============================================================================

#[tokio::test]
async fn test_daily_tip_sent_with_builtin_tip() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider.clone(), true)),
    );

    let (status, body) = call(app, post_json("/api/v1/tips/daily", json!({"user_id": "alice"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);
    assert!(body["tip"]["title"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_daily_tip_reports_suppression() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider.clone(), true)),
    );

    let (status, body) = call(app, post_json("/api/v1/tips/daily", json!({"user_id": "carol"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], false);
    assert_eq!(body["reason"], "no_preferences");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_daily_tip_without_credentials_is_bad_gateway() {
    let provider = Arc::new(CountingProvider::default());
    let app = create_app(
        AppState::with_store(settings(), seeded_store()).with_push(dispatcher(provider.clone(), false)),
    );

    let (status, body) = call(app, post_json("/api/v1/tips/daily", json!({"user_id": "alice"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "CREDENTIAL_UNAVAILABLE");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Support email
// ============================================================================

fn email_store() -> Arc<MemoryRecipientStore> {
    let store = MemoryRecipientStore::new();
    store.insert_profile("dana", MemoryProfile::with_email("dana@example.com", Some("Dana Lee")));
    store.set_preferences("dana", PreferenceFlags::all_enabled());

    store.insert_profile("eli", MemoryProfile::with_email("eli@example.com", None));
    store.set_preferences(
        "eli",
        PreferenceFlags::all_enabled().with(NotificationCategory::SupportReplies, false),
    );

    store.insert_support_session("session-1", "Refund for cancelled tour");
    Arc::new(store)
}

#[tokio::test]
async fn test_support_email_unknown_user_is_not_found() {
    let app = create_app(AppState::with_store(settings(), email_store()));

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/support/email",
            json!({"user_id": "ghost", "type": "support_reply", "session_id": "session-1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_support_email_rejects_unknown_type() {
    let app = create_app(AppState::with_store(settings(), email_store()));

    let (status, _) = call(
        app,
        post_json(
            "/api/v1/support/email",
            json!({"user_id": "dana", "type": "newsletter", "session_id": "session-1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_support_email_respects_category_opt_out() {
    let email = Arc::new(CapturingEmail::default());
    let app = create_app(AppState::with_store(settings(), email_store()).with_email(email.clone()));

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/support/email",
            json!({"user_id": "eli", "type": "support_reply", "session_id": "session-1", "message": "Hi"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], false);
    assert_eq!(body["reason"], "support_reply_disabled");
    assert!(email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_support_email_sent_with_stored_subject() {
    let email = Arc::new(CapturingEmail::default());
    let app = create_app(AppState::with_store(settings(), email_store()).with_email(email.clone()));

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/support/email",
            json!({
                "user_id": "dana",
                "type": "ticket_status_changed",
                "session_id": "session-1",
                "new_status": "in_progress"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);

    let sent = email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "dana@example.com");
    assert!(sent[0].1.subject.contains("Refund for cancelled tour"));
    assert!(sent[0].1.html.contains("Dana Lee"));
}

#[tokio::test]
async fn test_support_email_without_provider_reports_failure() {
    let app = create_app(AppState::with_store(settings(), email_store()));

    let (status, body) = call(
        app,
        post_json(
            "/api/v1/support/email",
            json!({"user_id": "dana", "type": "ticket_created", "session_id": "session-1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], false);
    assert_eq!(body["reason"], "delivery_failed");
}
