#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, StatusCode, header},
};
use marquee::catalog::{MovieDetails, MovieSource, SourceError};
use marquee::{ServerConfig, create_app, db::Database, jwt::TokenCodec};
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"integration-access-secret-0123456789";
pub const REFRESH_SECRET: &[u8] = b"integration-refresh-secret-0123456789";

/// In-process stand-in for OMDb: a fixed list of result pages.
pub struct FakeSource {
    pages: Vec<Vec<(String, String)>>,
    pub searches: AtomicUsize,
}

impl FakeSource {
    /// `pages[n]` holds the (id, title) pairs of page n + 1.
    pub fn new(pages: &[&[(&str, &str)]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|page| {
                    page.iter()
                        .map(|(id, title)| (id.to_string(), title.to_string()))
                        .collect()
                })
                .collect(),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    fn title_of(&self, movie_id: &str) -> Option<&str> {
        self.pages
            .iter()
            .flatten()
            .find(|(id, _)| id == movie_id)
            .map(|(_, title)| title.as_str())
    }
}

#[async_trait]
impl MovieSource for FakeSource {
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<String>, SourceError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let keyword = keyword.to_lowercase();
        let Some(hits) = self.pages.get(page as usize - 1) else {
            return Ok(Vec::new());
        };
        Ok(hits
            .iter()
            .filter(|(_, title)| title.to_lowercase().contains(&keyword))
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn details(&self, movie_id: &str) -> Result<MovieDetails, SourceError> {
        let title = self
            .title_of(movie_id)
            .ok_or_else(|| SourceError::Api("Incorrect IMDb ID.".to_string()))?;
        let json = serde_json::json!({
            "imdbID": movie_id,
            "Title": title,
            "Genre": "Action",
            "Rated": "PG-13",
            "Released": "14 Jun 2013",
            "Poster": format!("https://img.example/{}.jpg", movie_id),
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "7.1/10"},
                {"Source": "Rotten Tomatoes", "Value": "56%"}
            ]
        });
        Ok(serde_json::from_value(json).unwrap())
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub codec: TokenCodec,
}

pub fn config(db: Database, source: Arc<dyn MovieSource>, attempts_per_minute: u32) -> ServerConfig {
    ServerConfig {
        db,
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
        secure_cookies: false,
        source,
        seed_query: "Superman".to_string(),
        login_attempts_per_minute: attempts_per_minute,
        ip_extractor: None,
    }
}

/// App over an in-memory database with an empty fake source and a rate
/// limit high enough to never trigger.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(Arc::new(FakeSource::empty()), 10_000).await
}

pub async fn create_test_app_with(source: Arc<dyn MovieSource>, attempts_per_minute: u32) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    app_for(db, source, attempts_per_minute)
}

pub fn app_for(db: Database, source: Arc<dyn MovieSource>, attempts_per_minute: u32) -> TestApp {
    let app = create_app(&config(db.clone(), source, attempts_per_minute));
    TestApp {
        app,
        db,
        codec: TokenCodec::new(ACCESS_SECRET, REFRESH_SECRET),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Peer address attached to every test request, as `serve` with connect
/// info would.
pub const TEST_PEER: ([u8; 4], u16) = ([127, 0, 0, 1], 40000);

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from(TEST_PEER)));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from(TEST_PEER)))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value set for `name` by a non-deleting Set-Cookie.
pub fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .filter(|c| !c.contains("Max-Age=0"))
        .find_map(|c| c.strip_prefix(&prefix))
        .and_then(|rest| rest.split(';').next())
        .map(|v| v.to_string())
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], name: &str) -> bool {
    let prefix = format!("{}=;", name);
    cookies
        .iter()
        .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Decode the `message` query parameter of a redirect.
pub fn redirect_message(response: &Response<Body>) -> Option<String> {
    let location = location(response);
    let (_, query) = location.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "message")
        .map(|(_, v)| v.into_owned())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register and log in through the HTTP endpoints. Returns
/// (access_token, refresh_token).
pub async fn register_and_login(app: &Router, username: &str, password: &str) -> (String, String) {
    let body = format!(
        "username={}&password={}&confirmPassword={}",
        username, password, password
    );
    let response = send(app, post_form("/register", &body, None)).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let body = format!("username={}&password={}", username, password);
    let response = send(app, post_form("/login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let cookies = extract_set_cookies(&response);
    (
        cookie_value(&cookies, "accessToken").expect("access cookie"),
        cookie_value(&cookies, "refreshToken").expect("refresh cookie"),
    )
}

pub fn auth_cookies(access_token: &str, refresh_token: &str) -> String {
    format!("accessToken={}; refreshToken={}", access_token, refresh_token)
}

pub fn refresh_cookie_only(refresh_token: &str) -> String {
    format!("refreshToken={}", refresh_token)
}
