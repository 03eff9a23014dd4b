mod common;

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use common::*;
use marquee::{cli::IpExtractor, create_app, db::Database};

fn login_from(forwarded_for: Option<&str>) -> axum::http::Request<axum::body::Body> {
    let mut request = post_form("/login", "username=alice&password=guess", None);
    if let Some(ip) = forwarded_for {
        request
            .headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_str(ip).unwrap());
    }
    request
}

#[tokio::test]
async fn test_login_attempts_are_rate_limited() {
    let t = create_test_app_with(Arc::new(FakeSource::empty()), 3).await;

    for _ in 0..3 {
        let response = send(
            &t.app,
            post_form("/login", "username=alice&password=guess", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    let response = send(
        &t.app,
        post_form("/login", "username=alice&password=guess", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Only the credential posts are limited.
    let response = send(&t.app, get("/login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_registrations_are_rate_limited() {
    let t = create_test_app_with(Arc::new(FakeSource::empty()), 1).await;

    let response = send(
        &t.app,
        post_form(
            "/register",
            "username=alice&password=pw&confirmPassword=nope",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = send(
        &t.app,
        post_form(
            "/register",
            "username=bob&password=pw&confirmPassword=pw",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(t.db.users().get_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_forwarded_clients_get_separate_buckets() {
    let db = Database::open(":memory:").await.unwrap();
    let mut config = config(db, Arc::new(FakeSource::empty()), 1);
    config.ip_extractor = Some(IpExtractor::XForwardedFor);
    let app = create_app(&config);

    // Every request arrives from the same proxy peer address.
    let response = send(&app, login_from(Some("203.0.113.1"))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let response = send(&app, login_from(Some("203.0.113.1"))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = send(&app, login_from(Some("10.0.0.1, 203.0.113.2"))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_missing_ip_header_is_refused() {
    let db = Database::open(":memory:").await.unwrap();
    let mut config = config(db, Arc::new(FakeSource::empty()), 10);
    config.ip_extractor = Some(IpExtractor::XRealIp);
    let app = create_app(&config);

    let response = send(&app, login_from(None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Credential-free pages are not behind the limiter.
    let response = send(&app, get("/login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
